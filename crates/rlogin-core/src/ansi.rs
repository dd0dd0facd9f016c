//! Strips terminal control sequences from received data before it is
//! matched against patterns or recorded in a transcript.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CSI_PARAMS: Regex = Regex::new(r"\x1b\[[\?>]?\d+(;\d+)*[@A-Za-z]").unwrap();
    static ref CSI_MODE: Regex = Regex::new(r"\x1b\[=\d+h").unwrap();
    static ref BELL: Regex = Regex::new("\x07").unwrap();
    static ref BARE_CR: Regex = Regex::new("\r").unwrap();
}

/// Removes CSI parameter sequences, CSI mode-set sequences, bell characters,
/// and bare carriage returns.
pub fn strip_ansi(input: &str) -> String {
    let step1 = CSI_PARAMS.replace_all(input, "");
    let step2 = CSI_MODE.replace_all(&step1, "");
    let step3 = BELL.replace_all(&step2, "");
    BARE_CR.replace_all(&step3, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_csi_params_and_bell() {
        let raw = "\x1b[1;32mhello\x1b[0m\x07 world\r\n";
        assert_eq!(strip_ansi(raw), "hello world\n");
    }

    #[test]
    fn strips_csi_mode_set() {
        let raw = "\x1b[=1hprompt> ";
        assert_eq!(strip_ansi(raw), "prompt> ");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(strip_ansi("plain text"), "plain text");
    }
}
