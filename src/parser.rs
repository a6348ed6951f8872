use crate::error::{Result, ShellError};

/// One stage: a program name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        let mut words = segment.split_whitespace();
        let program = words.next()?;
        Some(Self::new(program, words))
    }
}

/// Stages in execution order, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<CommandSpec>,
}

impl Pipeline {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Build the pipeline for `line`.
///
/// A blank line yields `Ok(None)`. A `|` with no command on one side is a
/// syntax error naming the 1-based stage position.
pub fn build(line: &str) -> Result<Option<Pipeline>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let stages = line
        .split('|')
        .enumerate()
        .map(|(i, segment)| {
            CommandSpec::from_segment(segment).ok_or(ShellError::EmptyStage { position: i + 1 })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(Pipeline { stages }))
}
