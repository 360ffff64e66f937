//! Aggregate usage facts gathered in one pass over a program.

use crate::program::{Dimension, IndirectRef, Program, Token};
use crate::types::{File, FileSet};

/// Result of [`scan_program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanInfo {
    /// Files indexed through an address register anywhere in the program.
    pub indirect_files: FileSet,
    /// Files whose outer (2D) index is taken from an address register.
    pub dimension_indirect_files: FileSet,
    pub indirect_files_read: FileSet,
    pub indirect_files_written: FileSet,
    pub num_instructions: u32,
}

impl ScanInfo {
    pub fn is_indirect(&self, file: File) -> bool {
        self.indirect_files.contains(FileSet::from(file))
    }

    pub fn is_dimension_indirect(&self, file: File) -> bool {
        self.dimension_indirect_files.contains(FileSet::from(file))
    }

    fn note(
        &mut self,
        file: File,
        indirect: Option<IndirectRef>,
        dimension: Option<Dimension>,
        written: bool,
    ) {
        let bit = FileSet::from(file);
        if indirect.is_some() {
            self.indirect_files |= bit;
            if written {
                self.indirect_files_written |= bit;
            } else {
                self.indirect_files_read |= bit;
            }
        }
        if dimension.is_some_and(|d| d.indirect.is_some()) {
            self.dimension_indirect_files |= bit;
        }
    }
}

/// Computes which register files are addressed indirectly.
pub fn scan_program(program: &Program) -> ScanInfo {
    let mut info = ScanInfo::default();
    for token in &program.tokens {
        let Token::Instruction(inst) = token else {
            continue;
        };
        info.num_instructions += 1;
        for src in &inst.src {
            info.note(src.file, src.indirect, src.dimension, false);
        }
        for dst in &inst.dst {
            info.note(dst.file, dst.indirect, dst.dimension, true);
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;
    use crate::program::{DstRegister, Instruction, SrcRegister};
    use crate::types::Processor;

    fn addr() -> IndirectRef {
        IndirectRef {
            file: File::Address,
            index: 0,
            swizzle: 0,
        }
    }

    #[test]
    fn indirect_source_marks_file_read() {
        let mut src = SrcRegister::new(File::Input, 2);
        src.indirect = Some(addr());
        let mut mov = Instruction::new(Opcode::Mov);
        mov.dst.push(DstRegister::new(File::Temporary, 0));
        mov.src.push(src);

        let mut program = Program::new(Processor::Fragment);
        program.tokens.push(Token::Instruction(mov));
        let info = scan_program(&program);

        assert!(info.is_indirect(File::Input));
        assert!(!info.is_indirect(File::Temporary));
        assert_eq!(info.indirect_files_read, FileSet::INPUT);
        assert!(info.indirect_files_written.is_empty());
        assert_eq!(info.num_instructions, 1);
    }

    #[test]
    fn indirect_dimension_is_tracked_separately() {
        let mut src = SrcRegister::new(File::Constant, 0);
        src.dimension = Some(Dimension {
            index: 1,
            indirect: Some(addr()),
        });
        let mut mov = Instruction::new(Opcode::Mov);
        mov.dst.push(DstRegister::new(File::Output, 0));
        mov.src.push(src);

        let mut program = Program::new(Processor::Vertex);
        program.tokens.push(Token::Instruction(mov));
        let info = scan_program(&program);

        assert!(info.is_dimension_indirect(File::Constant));
        assert!(!info.is_indirect(File::Constant));
    }
}
