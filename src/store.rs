use std::{
    fs::{self, File},
    io::{BufRead, BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::BenchError;
use crate::render::{self, Format};
use crate::result::ResultCollection;

/// A named location holding one rendered collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Results,
    Baseline,
}

impl Slot {
    pub fn dir_name(self) -> &'static str {
        match self {
            Slot::Results => "results",
            Slot::Baseline => "baseline",
        }
    }
}

/// Decides whether the current results replace the baseline.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Fixed answer, for non-interactive runs and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&mut self, _question: &str) -> bool {
        self.0
    }
}

/// Asks on a writer and reads one line; only an answer starting with `y` or
/// `Y` confirms.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, question: &str) -> bool {
        let _ = write!(self.output, "\n{question} [y/N] ");
        let _ = self.output.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(_) => matches!(line.chars().next(), Some('y' | 'Y')),
            Err(_) => false,
        }
    }
}

pub type StdinConfirm = PromptConfirm<std::io::StdinLock<'static>, std::io::Stdout>;

impl StdinConfirm {
    pub fn stdin() -> Self {
        PromptConfirm::new(std::io::stdin().lock(), std::io::stdout())
    }
}

/// The `results` and `baseline` slots under one root directory.
#[derive(Clone, Debug)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn slot_dir(&self, slot: Slot) -> PathBuf {
        self.root.join(slot.dir_name())
    }

    pub fn report_path(&self, slot: Slot, format: Format) -> PathBuf {
        self.slot_dir(slot).join(format.file_name())
    }

    /// Write every report format into `slot`.
    pub fn save(&self, slot: Slot, collection: &ResultCollection) -> Result<(), BenchError> {
        let dir = self.slot_dir(slot);
        write_reports(&dir, collection)?;
        info!(path = %dir.display(), records = collection.len(), "reports written");
        Ok(())
    }

    /// Load the collection stored in `slot`; `Ok(None)` when nothing was saved.
    pub fn load(&self, slot: Slot) -> Result<Option<ResultCollection>, BenchError> {
        let path = self.report_path(slot, Format::Json);
        if !path.exists() {
            debug!(path = %path.display(), "no stored collection");
            return Ok(None);
        }
        let data =
            fs::read(&path).map_err(|e| BenchError::storage(path.display().to_string(), e.to_string()))?;
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| BenchError::malformed(path.display().to_string(), e.to_string()))
    }

    /// Ask `confirm` and, on yes, replace the baseline with `collection`.
    ///
    /// The new baseline is written to a staging directory first and swapped
    /// in afterwards, so a failed write leaves the previous baseline intact.
    pub fn promote(
        &self,
        collection: &ResultCollection,
        confirm: &mut dyn Confirm,
    ) -> Result<bool, BenchError> {
        if !confirm.confirm("Do you want to save the new results as the next baseline?") {
            return Ok(false);
        }
        let target = self.slot_dir(Slot::Baseline);
        let staging = self.root.join("baseline.staging");
        let retired = self.root.join("baseline.old");
        remove_dir_if_present(&staging)?;
        remove_dir_if_present(&retired)?;
        write_reports(&staging, collection)?;
        if target.exists() {
            fs::rename(&target, &retired)
                .map_err(|e| BenchError::storage(target.display().to_string(), e.to_string()))?;
        }
        if let Err(e) = fs::rename(&staging, &target) {
            if retired.exists() {
                let _ = fs::rename(&retired, &target);
            }
            return Err(BenchError::storage(target.display().to_string(), e.to_string()));
        }
        remove_dir_if_present(&retired)?;
        info!(path = %target.display(), "baseline updated");
        Ok(true)
    }
}

fn write_reports(dir: &Path, collection: &ResultCollection) -> Result<(), BenchError> {
    fs::create_dir_all(dir)
        .map_err(|e| BenchError::storage(dir.display().to_string(), e.to_string()))?;
    for format in Format::ALL {
        let path = dir.join(format.file_name());
        let file = File::create(&path)
            .map_err(|e| BenchError::storage(path.display().to_string(), e.to_string()))?;
        let mut writer = BufWriter::new(file);
        render::render(format, collection, &mut writer)?;
        writer
            .flush()
            .map_err(|e| BenchError::storage(path.display().to_string(), e.to_string()))?;
    }
    Ok(())
}

fn remove_dir_if_present(dir: &Path) -> Result<(), BenchError> {
    if dir.exists() {
        fs::remove_dir_all(dir)
            .map_err(|e| BenchError::storage(dir.display().to_string(), e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_prompt_accepts_leading_y_only() {
        let answers = [
            ("y\n", true),
            ("Yes\n", true),
            ("\n", false),
            ("no\n", false),
            ("", false),
            (" y\n", false),
        ];
        for (input, expected) in answers {
            let mut out = Vec::new();
            let mut prompt = PromptConfirm::new(Cursor::new(input), &mut out);
            assert_eq!(prompt.confirm("save?"), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_prompt_writes_question() {
        let mut out = Vec::new();
        PromptConfirm::new(Cursor::new("n\n"), &mut out).confirm("save?");
        assert_eq!(String::from_utf8(out).unwrap(), "\nsave? [y/N] ");
    }
}
