//! Compiled programs and their section-ordered assembly.

use serde::{Deserialize, Serialize};

use crate::compiler::RobotBrand;

/// Character encoding declared for an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Encoding {
    /// UTF-8
    #[default]
    Utf8,
    /// 7-bit ASCII
    Ascii,
}

/// One output file of a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotProgramFile {
    /// File name without the extension
    pub name: String,
    /// Extension without the dot
    pub extension: String,
    /// File contents, one entry per line
    pub lines: Vec<String>,
    /// Encoding the file must be written with
    pub encoding: Encoding,
    /// Line comment marker of the language
    pub comment_char: String,
}

impl RobotProgramFile {
    /// `name.extension`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }

    /// All lines joined with `\n`, with a trailing newline.
    pub fn contents(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// A compiled program: a named set of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Program name
    pub name: String,
    /// Brand the program was compiled for
    pub brand: RobotBrand,
    /// Output files, main file first
    pub files: Vec<RobotProgramFile>,
}

impl Program {
    /// An empty program.
    pub fn new(name: impl Into<String>, brand: RobotBrand) -> Self {
        Self {
            name: name.into(),
            brand,
            files: Vec::new(),
        }
    }

    /// Append a file.
    pub fn add_file(&mut self, file: RobotProgramFile) {
        self.files.push(file);
    }

    /// The first (main) file, if any.
    pub fn main_file(&self) -> Option<&RobotProgramFile> {
        self.files.first()
    }

    /// Lines of every file in order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.files.iter().flat_map(|file| file.lines.iter().map(String::as_str))
    }

    /// Contents of every file concatenated.
    pub fn to_text(&self) -> String {
        self.files.iter().map(RobotProgramFile::contents).collect()
    }
}

/// Output sections in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    /// Module or program opening
    Header,
    /// Tool declarations
    Tools,
    /// Speed declarations
    Speeds,
    /// Zone declarations
    Zones,
    /// Custom code declarations
    Custom,
    /// Target declarations
    Targets,
    /// Opening of the main routine
    MainOpen,
    /// Body of the main routine
    Main,
    /// Closing of the main routine
    MainClose,
    /// Module or program closing
    Footer,
}

impl Section {
    const ORDER: [Section; 10] = [
        Section::Header,
        Section::Tools,
        Section::Speeds,
        Section::Zones,
        Section::Custom,
        Section::Targets,
        Section::MainOpen,
        Section::Main,
        Section::MainClose,
        Section::Footer,
    ];

    /// Sections printed without a blank line before them.
    fn is_glued(&self) -> bool {
        matches!(self, Section::Main | Section::MainClose)
    }
}

/// Collects lines per [`Section`] and renders them in a fixed order.
///
/// Empty sections are omitted. Non-empty sections are separated by one
/// blank line, except that the body of the main routine and its closing
/// lines follow their opening directly.
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    sections: [Vec<String>; 10],
}

impl ProgramBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn index(section: Section) -> usize {
        section as usize
    }

    /// Append `line` to `section`.
    pub fn push(&mut self, section: Section, line: impl Into<String>) {
        self.sections[Self::index(section)].push(line.into());
    }

    /// Whether `section` has no lines yet.
    pub fn is_empty(&self, section: Section) -> bool {
        self.sections[Self::index(section)].is_empty()
    }

    /// All lines in section order.
    pub fn build(self) -> Vec<String> {
        let mut out = Vec::new();
        for section in Section::ORDER {
            let lines = &self.sections[Self::index(section)];
            if lines.is_empty() {
                continue;
            }
            if !out.is_empty() && !section.is_glued() {
                out.push(String::new());
            }
            out.extend(lines.iter().cloned());
        }
        out
    }
}
