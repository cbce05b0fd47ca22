//! Local speech synthesis, used as a fallback to server-rendered audio.
//!
//! Language names map to locale codes through a fixed table; unknown names
//! fall back to [`DEFAULT_LOCALE`]. The platform synthesizer is an external
//! program (`espeak-ng`/`espeak` on Linux, `say` on macOS) found on `PATH`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

/// Locale used for language names missing from [`LANGUAGE_LOCALES`].
pub const DEFAULT_LOCALE: &str = "en-US";

/// Supported learner languages and their speech locales.
pub const LANGUAGE_LOCALES: [(&str, &str); 16] = [
    ("English", "en-US"),
    ("Spanish", "es-ES"),
    ("French", "fr-FR"),
    ("German", "de-DE"),
    ("Italian", "it-IT"),
    ("Portuguese", "pt-PT"),
    ("Chinese", "zh-CN"),
    ("Japanese", "ja-JP"),
    ("Korean", "ko-KR"),
    ("Russian", "ru-RU"),
    ("Arabic", "ar-SA"),
    ("Hindi", "hi-IN"),
    ("Dutch", "nl-NL"),
    ("Swedish", "sv-SE"),
    ("Polish", "pl-PL"),
    ("Turkish", "tr-TR"),
];

pub fn locale_for(language: &str) -> &'static str {
    LANGUAGE_LOCALES
        .iter()
        .find(|(name, _)| *name == language)
        .map_or(DEFAULT_LOCALE, |&(_, locale)| locale)
}

pub fn is_known_language(language: &str) -> bool {
    LANGUAGE_LOCALES.iter().any(|(name, _)| *name == language)
}

/// Language part of a locale code (`"es-ES"` → `"es"`).
fn language_prefix(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("no speech synthesizer found (tried espeak-ng, espeak, say)")]
    NoSynthesizer,

    #[error("failed to run {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to pass text to {program:?}: {source}")]
    Input {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program:?} exited with {status}")]
    Failed {
        program: PathBuf,
        status: std::process::ExitStatus,
    },
}

/// A voice offered by the platform synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// Locale as reported by the platform, e.g. `en-us` or `en_US`.
    pub lang: String,
}

/// Platform speech capability.
pub trait SpeechSynthesizer: Send {
    /// Stops any utterance in progress. Never fails.
    fn cancel(&mut self);

    /// Starts speaking `text` in `locale` without waiting for it to finish.
    fn speak(&mut self, text: &str, locale: &str) -> Result<(), SpeechError>;

    fn voices(&self) -> Result<Vec<Voice>, SpeechError>;
}

/// Speaks `text` in the locale of `language`, interrupting earlier speech.
pub fn speak_text_fallback(
    synth: &mut dyn SpeechSynthesizer,
    text: &str,
    language: &str,
) -> Result<(), SpeechError> {
    let locale = locale_for(language);
    synth.cancel();
    debug!(locale, "speaking through local synthesizer");
    synth.speak(text, locale)
}

/// Voices whose locale shares the language prefix of `language`'s locale.
pub fn voices_for_language(
    synth: &dyn SpeechSynthesizer,
    language: &str,
) -> Result<Vec<Voice>, SpeechError> {
    let prefix = language_prefix(locale_for(language)).to_ascii_lowercase();
    Ok(synth
        .voices()?
        .into_iter()
        .filter(|v| v.lang.to_ascii_lowercase().starts_with(&prefix))
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Espeak,
    Say,
}

/// [`SpeechSynthesizer`] backed by a command-line program.
#[derive(Debug)]
pub struct CommandSynthesizer {
    program: PathBuf,
    backend: Backend,
    child: Option<Child>,
}

impl CommandSynthesizer {
    /// Looks up a supported synthesizer on `PATH`.
    pub fn detect() -> Result<Self, SpeechError> {
        let candidates = [
            ("espeak-ng", Backend::Espeak),
            ("espeak", Backend::Espeak),
            ("say", Backend::Say),
        ];
        for (name, backend) in candidates {
            if let Ok(program) = which::which(name) {
                debug!(program = %program.display(), "found speech synthesizer");
                return Ok(Self {
                    program,
                    backend,
                    child: None,
                });
            }
        }
        Err(SpeechError::NoSynthesizer)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn list_voices(&self, args: &[&str]) -> Result<String, SpeechError> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(SpeechError::Failed {
                program: self.program.clone(),
                status: output.status,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            // Already-exited children make kill fail; that is fine.
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn speak(&mut self, text: &str, locale: &str) -> Result<(), SpeechError> {
        let voice = match self.backend {
            Backend::Espeak => None,
            // `say` picks voices by name, so choose one for the locale.
            Backend::Say => {
                let prefix = language_prefix(locale).to_ascii_lowercase();
                self.voices().ok().and_then(|voices| {
                    voices
                        .into_iter()
                        .find(|v| v.lang.to_ascii_lowercase().starts_with(&prefix))
                        .map(|v| v.name)
                })
            }
        };

        let mut child = Command::new(&self.program)
            .args(speak_args(self.backend, locale, voice.as_deref()))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Dropping stdin after the write closes it, which starts the speech.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(source) = stdin.write_all(text.as_bytes()) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SpeechError::Input {
                    program: self.program.clone(),
                    source,
                });
            }
        }
        self.child = Some(child);
        Ok(())
    }

    fn voices(&self) -> Result<Vec<Voice>, SpeechError> {
        match self.backend {
            Backend::Espeak => Ok(parse_espeak_voices(&self.list_voices(&["--voices"])?)),
            Backend::Say => Ok(parse_say_voices(&self.list_voices(&["-v", "?"])?)),
        }
    }
}

impl Drop for CommandSynthesizer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Arguments for one utterance. The text itself is always read from stdin,
/// so it can never be taken for an option.
fn speak_args(backend: Backend, locale: &str, voice: Option<&str>) -> Vec<String> {
    match backend {
        Backend::Espeak => vec![
            "--stdin".to_owned(),
            "-v".to_owned(),
            language_prefix(locale).to_owned(),
        ],
        Backend::Say => {
            let mut args = Vec::new();
            if let Some(voice) = voice {
                args.push("-v".to_owned());
                args.push(voice.to_owned());
            }
            args.push("-f".to_owned());
            args.push("-".to_owned());
            args
        }
    }
}

/// Parses `espeak --voices`:
/// `Pty Language Age/Gender VoiceName File Other Languages`.
fn parse_espeak_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            match cols.as_slice() {
                [_pty, lang, _gender, name, ..] => Some(Voice {
                    name: (*name).to_owned(),
                    lang: (*lang).to_owned(),
                }),
                _ => {
                    warn!(line, "unrecognised espeak voice line");
                    None
                }
            }
        })
        .collect()
}

/// Parses `say -v ?`: `Name  locale  # sample sentence`. Names may contain
/// spaces, so the locale is the last token before `#`.
fn parse_say_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim();
            let (name, lang) = head.rsplit_once(char::is_whitespace)?;
            Some(Voice {
                name: name.trim().to_owned(),
                lang: lang.to_owned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeSynth {
        calls: Vec<String>,
        voices: Vec<Voice>,
    }

    impl SpeechSynthesizer for FakeSynth {
        fn cancel(&mut self) {
            self.calls.push("cancel".to_owned());
        }

        fn speak(&mut self, text: &str, locale: &str) -> Result<(), SpeechError> {
            self.calls.push(format!("speak {locale} {text}"));
            Ok(())
        }

        fn voices(&self) -> Result<Vec<Voice>, SpeechError> {
            Ok(self.voices.clone())
        }
    }

    fn voice(name: &str, lang: &str) -> Voice {
        Voice {
            name: name.to_owned(),
            lang: lang.to_owned(),
        }
    }

    #[test]
    fn unknown_language_uses_default_locale() {
        assert_eq!(locale_for("Spanish"), "es-ES");
        assert_eq!(locale_for("Klingon"), DEFAULT_LOCALE);
        assert!(is_known_language("Turkish"));
        assert!(!is_known_language("spanish"));
    }

    #[test]
    fn fallback_cancels_before_speaking() {
        let mut synth = FakeSynth::default();
        speak_text_fallback(&mut synth, "Hola", "Spanish").unwrap();
        speak_text_fallback(&mut synth, "Hello", "Elvish").unwrap();
        assert_eq!(
            synth.calls,
            vec!["cancel", "speak es-ES Hola", "cancel", "speak en-US Hello"]
        );
    }

    #[test]
    fn voices_are_filtered_by_language_prefix() {
        let synth = FakeSynth {
            voices: vec![
                voice("Monica", "es_ES"),
                voice("Paulina", "es_MX"),
                voice("Alex", "en_US"),
                voice("Spanish", "es"),
            ],
            ..FakeSynth::default()
        };
        let names: Vec<String> = voices_for_language(&synth, "Spanish")
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["Monica", "Paulina", "Spanish"]);
    }

    #[test]
    fn utterance_text_never_reaches_the_command_line() {
        let text = "-w/tmp/x";
        for (backend, voice) in [(Backend::Espeak, None), (Backend::Say, Some("Monica"))] {
            let args = speak_args(backend, "es-ES", voice);
            assert!(!args.iter().any(|a| a.contains(text)), "{args:?}");
        }
        assert_eq!(speak_args(Backend::Espeak, "es-ES", None), ["--stdin", "-v", "es"]);
        assert_eq!(
            speak_args(Backend::Say, "es-ES", Some("Monica")),
            ["-v", "Monica", "-f", "-"]
        );
        assert_eq!(speak_args(Backend::Say, "xx", None), ["-f", "-"]);
    }

    #[test]
    fn parses_espeak_voice_listing() {
        let output = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n \
             5  af              --/M      Afrikaans          gmw/af\n \
             5  en-us           --/M      English_(America)  gmw/en-US            (en 10)\n";
        assert_eq!(
            parse_espeak_voices(output),
            vec![
                voice("Afrikaans", "af"),
                voice("English_(America)", "en-us")
            ]
        );
    }

    #[test]
    fn parses_say_voice_listing() {
        let output = "Alex                en_US    # Most people recognize me by my voice.\n\
                      Bad News            en_US    # The light you see at the end of the tunnel.\n";
        assert_eq!(
            parse_say_voices(output),
            vec![voice("Alex", "en_US"), voice("Bad News", "en_US")]
        );
    }
}
