use crate::reconcile::Confirm;
use std::io::{self, BufRead, Write};

/// Asks on stderr and reads the answer from stdin.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, headline: &str, detail: &str) -> bool {
        let mut stderr = io::stderr();
        let _ = writeln!(stderr, "{}", headline);
        let _ = write!(stderr, "{} [y/N]: ", detail);
        let _ = stderr.flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
