//! Progress reporting types

/// Progress update emitted by [`super::ArkOperations`]
#[derive(Debug, Clone)]
pub struct ArkProgress {
    /// Current operation phase
    pub phase: ArkPhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items
    pub total: usize,
    /// Entry path being processed, if any
    pub current_file: Option<String>,
}

impl ArkProgress {
    #[must_use]
    pub fn new(phase: ArkPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
        }
    }

    /// Progress update naming the entry being processed
    #[must_use]
    pub fn with_file(
        phase: ArkPhase,
        current: usize,
        total: usize,
        file: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: Some(file.into()),
        }
    }

    /// Progress fraction (0.0 - 1.0)
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

/// Phase of an archive operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArkPhase {
    /// Parsing the header
    ReadingHeader,
    /// Walking a source directory
    ScanningFiles,
    /// Adding files to the staging set
    StagingFiles,
    /// Copying staged data into parts and rewriting the header
    Committing,
    /// Copying entry bytes to disk
    ExtractingFiles,
    /// Operation complete
    Complete,
}

impl ArkPhase {
    /// Human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadingHeader => "Reading header",
            Self::ScanningFiles => "Scanning files",
            Self::StagingFiles => "Staging files",
            Self::Committing => "Committing",
            Self::ExtractingFiles => "Extracting files",
            Self::Complete => "Complete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert!((ArkProgress::new(ArkPhase::Complete, 0, 0).percentage() - 1.0).abs() < f32::EPSILON);
        let half = ArkProgress::with_file(ArkPhase::ExtractingFiles, 2, 4, "a.dta");
        assert!((half.percentage() - 0.5).abs() < f32::EPSILON);
        assert_eq!(half.current_file.as_deref(), Some("a.dta"));
    }
}
