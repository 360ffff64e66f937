//! Fluent construction of TGSI programs for tests.

use crate::opcode::Opcode;
use crate::program::{
    DeclImage, DeclSamplerView, DeclSemantic, Declaration, Dimension, DstRegister, Immediate,
    IndirectRef, Instruction, Program, Property, SrcRegister, Swizzle, TexOffset, TextureInfo,
    Token, WriteMask,
};
use crate::types::{
    File, ImageFormat, InterpLocation, Interpolate, Processor, ReturnType, Semantic, TextureTarget,
};

pub fn dst(file: File, index: i32) -> DstRegister {
    DstRegister::new(file, index)
}

pub fn dst_mask(file: File, index: i32, mask: u8) -> DstRegister {
    let mut reg = DstRegister::new(file, index);
    reg.write_mask = WriteMask(mask);
    reg
}

pub fn src(file: File, index: i32) -> SrcRegister {
    SrcRegister::new(file, index)
}

pub fn src_swz(file: File, index: i32, swizzle: [u8; 4]) -> SrcRegister {
    let mut reg = SrcRegister::new(file, index);
    reg.swizzle = Swizzle(swizzle);
    reg
}

/// `file[ADDR[0].x + index]`
pub fn src_indirect(file: File, index: i32) -> SrcRegister {
    let mut reg = SrcRegister::new(file, index);
    reg.indirect = Some(addr0());
    reg
}

/// `file[ADDR[0].x + index]` as a destination.
pub fn dst_indirect(file: File, index: i32) -> DstRegister {
    let mut reg = DstRegister::new(file, index);
    reg.indirect = Some(addr0());
    reg
}

/// `file[dim][index]`
pub fn src_dim(file: File, dim: i32, index: i32) -> SrcRegister {
    let mut reg = SrcRegister::new(file, index);
    reg.dimension = Some(Dimension {
        index: dim,
        indirect: None,
    });
    reg
}

pub fn addr0() -> IndirectRef {
    IndirectRef {
        file: File::Address,
        index: 0,
        swizzle: 0,
    }
}

pub fn imm_offset(index: u32, swizzle: [u8; 3]) -> TexOffset {
    TexOffset {
        file: File::Immediate,
        index,
        swizzle_x: swizzle[0],
        swizzle_y: swizzle[1],
        swizzle_z: swizzle[2],
    }
}

/// Builds a [`Program`] token by token.
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new(processor: Processor) -> Self {
        Self {
            program: Program::new(processor),
        }
    }

    pub fn decl(mut self, decl: Declaration) -> Self {
        self.program.tokens.push(Token::Declaration(decl));
        self
    }

    pub fn input(self, index: u32, name: Semantic, sid: u32) -> Self {
        self.input_interp(
            index,
            name,
            sid,
            Interpolate::Perspective,
            InterpLocation::Center,
        )
    }

    pub fn input_interp(
        self,
        index: u32,
        name: Semantic,
        sid: u32,
        interpolate: Interpolate,
        location: InterpLocation,
    ) -> Self {
        let mut decl = Declaration::new(File::Input, index, index);
        decl.semantic = Some(DeclSemantic { name, index: sid });
        decl.interpolate = interpolate;
        decl.location = location;
        self.decl(decl)
    }

    /// Declares `IN[first..=last]` as one array of consecutive semantic indices.
    pub fn input_array(self, first: u32, last: u32, name: Semantic, sid: u32) -> Self {
        let mut this = self;
        for i in first..=last {
            this = this.input(i, name, sid + (i - first));
        }
        this
    }

    pub fn output(self, index: u32, name: Semantic, sid: u32) -> Self {
        let mut decl = Declaration::new(File::Output, index, index);
        decl.semantic = Some(DeclSemantic { name, index: sid });
        self.decl(decl)
    }

    pub fn output_array(self, first: u32, last: u32, name: Semantic, sid: u32) -> Self {
        let mut this = self;
        for i in first..=last {
            this = this.output(i, name, sid + (i - first));
        }
        this
    }

    pub fn system_value(self, index: u32, name: Semantic) -> Self {
        let mut decl = Declaration::new(File::SystemValue, index, index);
        decl.semantic = Some(DeclSemantic { name, index: 0 });
        self.decl(decl)
    }

    pub fn temps(self, first: u32, last: u32) -> Self {
        self.decl(Declaration::new(File::Temporary, first, last))
    }

    pub fn temp_array(self, first: u32, last: u32, array_id: u32) -> Self {
        let mut decl = Declaration::new(File::Temporary, first, last);
        decl.array_id = array_id;
        self.decl(decl)
    }

    pub fn address(self, last: u32) -> Self {
        self.decl(Declaration::new(File::Address, 0, last))
    }

    pub fn constants(self, first: u32, last: u32) -> Self {
        self.decl(Declaration::new(File::Constant, first, last))
    }

    pub fn ubo(self, slot: u32, first: u32, last: u32) -> Self {
        let mut decl = Declaration::new(File::Constant, first, last);
        decl.dimension = Some(slot);
        self.decl(decl)
    }

    pub fn sampler(self, index: u32) -> Self {
        self.decl(Declaration::new(File::Sampler, index, index))
    }

    pub fn sampler_view(
        self,
        first: u32,
        last: u32,
        target: TextureTarget,
        return_type: ReturnType,
    ) -> Self {
        let mut decl = Declaration::new(File::SamplerView, first, last);
        decl.sampler_view = Some(DeclSamplerView {
            target,
            return_type,
        });
        self.decl(decl)
    }

    pub fn image(
        self,
        first: u32,
        last: u32,
        target: TextureTarget,
        format: ImageFormat,
        writable: bool,
    ) -> Self {
        let mut decl = Declaration::new(File::Image, first, last);
        decl.image = Some(DeclImage {
            target,
            format,
            writable,
        });
        self.decl(decl)
    }

    pub fn buffer(self, index: u32, atomic: bool) -> Self {
        let mut decl = Declaration::new(File::Buffer, index, index);
        decl.atomic = atomic;
        self.decl(decl)
    }

    pub fn hw_atomic(self, binding: u32, first: u32, last: u32) -> Self {
        let mut decl = Declaration::new(File::HwAtomic, first, last);
        decl.dimension = Some(binding);
        self.decl(decl)
    }

    pub fn memory(self) -> Self {
        self.decl(Declaration::new(File::Memory, 0, 0))
    }

    pub fn immediate(mut self, imm: Immediate) -> Self {
        self.program.tokens.push(Token::Immediate(imm));
        self
    }

    pub fn property(mut self, prop: Property) -> Self {
        self.program.tokens.push(Token::Property(prop));
        self
    }

    pub fn inst(mut self, inst: Instruction) -> Self {
        self.program.tokens.push(Token::Instruction(inst));
        self
    }

    pub fn op(self, opcode: Opcode, dst: Vec<DstRegister>, src: Vec<SrcRegister>) -> Self {
        let mut inst = Instruction::new(opcode);
        inst.dst = dst;
        inst.src = src;
        self.inst(inst)
    }

    pub fn tex(
        self,
        opcode: Opcode,
        target: TextureTarget,
        dst: Vec<DstRegister>,
        src: Vec<SrcRegister>,
        offsets: Vec<TexOffset>,
    ) -> Self {
        let mut inst = Instruction::new(opcode);
        inst.dst = dst;
        inst.src = src;
        inst.texture = Some(TextureInfo {
            target,
            return_type: ReturnType::Float,
            offsets,
        });
        self.inst(inst)
    }

    pub fn end(self) -> Self {
        self.inst(Instruction::new(Opcode::End))
    }

    pub fn build(self) -> Program {
        self.program
    }
}
