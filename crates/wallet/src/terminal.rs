//! Terminal prompter and report rendering for the `ethkey` binary

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::prompt::{Cancelled, PromptResult, Prompter};
use crate::report::WalletReport;

/// Closing advice printed after the secrets
pub const SAFETY_ADVICE: &str = "Store your mnemonic and private key safely and close your \
terminal before you go online again.";

/// Message printed when the user backs out
pub const CANCELLED_MESSAGE: &str = "You cancelled the wallet creation process!";

/// Prompter over a line reader and a writer
///
/// With `hidden_input` set, secrets are read through `rpassword` from the
/// controlling terminal so they are not echoed; otherwise they are read as
/// plain lines from `input`, which is what tests and pipes want.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
    hidden_input: bool,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stderr> {
    /// Prompts on stderr, answers from stdin, secrets from the terminal
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr(), true)
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W, hidden_input: bool) -> Self {
        Self {
            input,
            output,
            hidden_input,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, label: &str) -> PromptResult<String> {
        write!(self.output, "{label}").map_err(|_| Cancelled)?;
        self.output.flush().map_err(|_| Cancelled)?;
        self.read_line()
    }

    /// A line without its terminator; EOF or a read error cancels
    ///
    /// The raw buffer may hold a passphrase or mnemonic and is wiped on return.
    fn read_line(&mut self) -> PromptResult<String> {
        let mut line = Zeroizing::new(String::new());
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => Err(Cancelled),
            Ok(_) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn prompt_secret(&mut self, label: &str) -> PromptResult<SecretString> {
        let secret = if self.hidden_input {
            rpassword::prompt_password(label).map_err(|_| Cancelled)?
        } else {
            self.ask(label)?
        };
        Ok(SecretString::from(secret))
    }

    fn prompt_confirmation(&mut self, label: &str) -> PromptResult<bool> {
        loop {
            let answer = self.ask(label)?;
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                // No answer means no
                "" | "n" | "no" => return Ok(false),
                _ => {
                    let _ = writeln!(self.output, "Please answer yes or no.");
                }
            }
        }
    }

    fn prompt_choice(&mut self, label: &str, options: &[&str]) -> PromptResult<usize> {
        let _ = writeln!(self.output, "{label}");
        for (i, option) in options.iter().enumerate() {
            let _ = writeln!(self.output, "  {}) {}", i + 1, option);
        }
        loop {
            let answer = self.ask("> ")?;
            match answer.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => {
                    let _ = writeln!(
                        self.output,
                        "Please enter a number between 1 and {}.",
                        options.len()
                    );
                }
            }
        }
    }

    fn prompt_keystore(&mut self, label: &str) -> PromptResult<String> {
        loop {
            let answer = self.ask(label)?;
            let path = answer.trim();
            if path.is_empty() {
                continue;
            }
            match fs::read_to_string(path) {
                Ok(json) => return Ok(json),
                Err(e) => {
                    let _ = writeln!(self.output, "Cannot read {path}: {e}");
                }
            }
        }
    }

    fn notify(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }
}

/// Print the report for the user
pub fn render_report<W: Write>(report: &WalletReport, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    if let Some(mnemonic) = &report.mnemonic {
        writeln!(out, "============================================================")?;
        writeln!(out, "                    IMPORTANT - SAVE THIS!")?;
        writeln!(out, "============================================================")?;
        writeln!(out)?;
        writeln!(out, "Your mnemonic recovery phrase:")?;
        writeln!(out)?;

        // Display words in groups of 4 for readability
        let words: Vec<&str> = mnemonic.words().collect();
        for (i, chunk) in words.chunks(4).enumerate() {
            let start_num = i * 4 + 1;
            let formatted: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(j, word)| format!("{:2}. {:<12}", start_num + j, word))
                .collect();
            writeln!(out, "  {}", formatted.join("  ").trim_end())?;
        }
        writeln!(out)?;
    }

    if let Some(path) = &report.derivation_path {
        writeln!(out, "Derivation path: {path}")?;
    }
    writeln!(out, "Address:         {}", report.address)?;
    writeln!(out, "Private key:     {}", report.private_key_hex())?;

    if let Some(json) = &report.keystore_json {
        writeln!(out)?;
        writeln!(out, "Keystore:")?;
        writeln!(out, "{json}")?;
    }

    writeln!(out)?;
    writeln!(out, "{SAFETY_ADVICE}")?;
    Ok(())
}

/// Print the report, then save the keystore if a path was given
///
/// The report is written and flushed first so a failed file write never
/// costs the user the mnemonic or key.
pub fn deliver_report<W: Write>(
    report: &WalletReport,
    out: &mut W,
    keystore_out: Option<&Path>,
) -> Result<()> {
    render_report(report, out).context("Failed to print report")?;
    out.flush().context("Failed to print report")?;

    if let (Some(path), Some(json)) = (keystore_out, &report.keystore_json) {
        write_keystore_file(path, json)?;
    }
    Ok(())
}

/// Write keystore JSON readable by the owner only
pub fn write_keystore_file(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    fs::write(path, json)
        .with_context(|| format!("Failed to write keystore {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, permissions)
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Mode;
    use ethkey_crypto::{Address, ExposeSecret};
    use std::io::Cursor;

    fn prompter(input: &str) -> TerminalPrompter<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), false)
    }

    #[test]
    fn test_confirmation_answers() {
        let mut p = prompter("yes\nNo\n\nmaybe\ny\n");
        assert_eq!(p.prompt_confirmation("? "), Ok(true));
        assert_eq!(p.prompt_confirmation("? "), Ok(false));
        assert_eq!(p.prompt_confirmation("? "), Ok(false));
        assert_eq!(p.prompt_confirmation("? "), Ok(true));
        assert_eq!(p.prompt_confirmation("? "), Err(Cancelled));

        let output = String::from_utf8(p.into_output()).unwrap();
        assert!(output.contains("Please answer yes or no."));
    }

    #[test]
    fn test_choice_reprompts_until_valid() {
        let mut p = prompter("0\nfour\n3\n");
        assert_eq!(p.prompt_choice("Pick", &["a", "b", "c"]), Ok(2));
        let output = String::from_utf8(p.into_output()).unwrap();
        assert!(output.contains("  1) a"));
        assert!(output.contains("between 1 and 3"));
    }

    #[test]
    fn test_secret_keeps_inner_whitespace() {
        let mut p = prompter(" pass phrase \r\n");
        let secret = p.prompt_secret("Secret: ").unwrap();
        assert_eq!(secret.expose_secret(), " pass phrase ");
        assert!(matches!(p.prompt_secret("Secret: "), Err(Cancelled)));
    }

    #[test]
    fn test_secret_lines_read_independently() {
        let mut p = prompter("a much longer first secret\nab\n");
        let first = p.prompt_secret("Secret: ").unwrap();
        let second = p.prompt_secret("Secret: ").unwrap();
        assert_eq!(first.expose_secret(), "a much longer first secret");
        assert_eq!(second.expose_secret(), "ab");
    }

    fn report_with_keystore() -> WalletReport {
        WalletReport::new(
            Mode::FromKeystore,
            None,
            None,
            Address::new([0x11; 20]),
            SecretString::from(format!("0x{}", "22".repeat(32))),
            Some("{\"version\":3}".to_string()),
        )
    }

    #[test]
    fn test_report_printed_before_keystore_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let target = blocker.join("keystore.json");

        let report = report_with_keystore();
        let mut out = Vec::new();
        let err = deliver_report(&report, &mut out, Some(&target)).unwrap_err();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains(&format!("0x{}", "22".repeat(32))));
        assert!(printed.contains(SAFETY_ADVICE));
        assert!(format!("{err:#}").contains("Failed to create directory"));
        assert!(!target.exists());
    }

    #[test]
    fn test_deliver_report_writes_keystore() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("keystore.json");

        let report = report_with_keystore();
        let mut out = Vec::new();
        deliver_report(&report, &mut out, Some(&target)).unwrap();

        assert!(String::from_utf8(out).unwrap().contains("Keystore:"));
        assert_eq!(fs::read_to_string(&target).unwrap(), "{\"version\":3}");
    }

    #[test]
    fn test_keystore_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ks.json");
        fs::write(&file, "{\"version\":3}").unwrap();

        let input = format!("\n{}/missing.json\n{}\n", dir.path().display(), file.display());
        let mut p = prompter(&input);
        assert_eq!(p.prompt_keystore("Path: ").unwrap(), "{\"version\":3}");
        let output = String::from_utf8(p.into_output()).unwrap();
        assert!(output.contains("Cannot read"));
    }

    #[test]
    #[cfg(unix)]
    fn test_keystore_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("keystore.json");
        write_keystore_file(&path, "{}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
