//! TGSI opcodes and the operand type inference table.
//!
//! TGSI registers are untyped 32-bit lanes; the opcode alone decides whether
//! a lane is read or written as a float, a signed or unsigned integer, or half
//! of a double. [`Opcode::dst_type`] and [`Opcode::src_type`] expose that
//! decision so code generators can insert the matching bit casts.

use core::fmt;

/// Numeric interpretation of an instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeType {
    /// Raw bits moved without interpretation (`MOV`, `UCMP`).
    Untyped,
    Float,
    Signed,
    Unsigned,
    Double,
}

macro_rules! opcodes {
    ($($variant:ident => $name:literal,)*) => {
        /// Instruction opcode.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $($variant,)*
        }

        impl Opcode {
            /// Mnemonic as printed by the TGSI text dumper.
            pub fn name(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $name,)*
                }
            }
        }
    };
}

opcodes! {
    Arl => "ARL",
    Mov => "MOV",
    Lit => "LIT",
    Rcp => "RCP",
    Rsq => "RSQ",
    Exp => "EXP",
    Log => "LOG",
    Mul => "MUL",
    Add => "ADD",
    Dp3 => "DP3",
    Dp4 => "DP4",
    Dst => "DST",
    Min => "MIN",
    Max => "MAX",
    Slt => "SLT",
    Sge => "SGE",
    Mad => "MAD",
    Sub => "SUB",
    Lrp => "LRP",
    Sqrt => "SQRT",
    Dp2 => "DP2",
    Frc => "FRC",
    Flr => "FLR",
    Round => "ROUND",
    Ex2 => "EX2",
    Lg2 => "LG2",
    Pow => "POW",
    Xpd => "XPD",
    Abs => "ABS",
    Dph => "DPH",
    Cos => "COS",
    Ddx => "DDX",
    Ddy => "DDY",
    Kill => "KILL",
    Seq => "SEQ",
    Sin => "SIN",
    Sne => "SNE",
    Tex => "TEX",
    Txd => "TXD",
    Txp => "TXP",
    Cal => "CAL",
    Ret => "RET",
    Ssg => "SSG",
    Cmp => "CMP",
    Scs => "SCS",
    Txb => "TXB",
    Div => "DIV",
    Txl => "TXL",
    Brk => "BRK",
    If => "IF",
    Uif => "UIF",
    Else => "ELSE",
    Endif => "ENDIF",
    DdxFine => "DDX_FINE",
    DdyFine => "DDY_FINE",
    Ceil => "CEIL",
    I2f => "I2F",
    Not => "NOT",
    Trunc => "TRUNC",
    Shl => "SHL",
    And => "AND",
    Or => "OR",
    Mod => "MOD",
    Xor => "XOR",
    Txf => "TXF",
    Txq => "TXQ",
    Cont => "CONT",
    Emit => "EMIT",
    EndPrim => "ENDPRIM",
    BgnLoop => "BGNLOOP",
    BgnSub => "BGNSUB",
    EndLoop => "ENDLOOP",
    EndSub => "ENDSUB",
    Txqs => "TXQS",
    Resq => "RESQ",
    Nop => "NOP",
    Fseq => "FSEQ",
    Fsge => "FSGE",
    Fslt => "FSLT",
    Fsne => "FSNE",
    KillIf => "KILL_IF",
    End => "END",
    F2i => "F2I",
    Idiv => "IDIV",
    Imax => "IMAX",
    Imin => "IMIN",
    Ineg => "INEG",
    Isge => "ISGE",
    Ishr => "ISHR",
    Islt => "ISLT",
    F2u => "F2U",
    U2f => "U2F",
    Uadd => "UADD",
    Udiv => "UDIV",
    Umad => "UMAD",
    Umax => "UMAX",
    Umin => "UMIN",
    Umod => "UMOD",
    Umul => "UMUL",
    Useq => "USEQ",
    Usge => "USGE",
    Ushr => "USHR",
    Uslt => "USLT",
    Usne => "USNE",
    Switch => "SWITCH",
    Case => "CASE",
    Default => "DEFAULT",
    EndSwitch => "ENDSWITCH",
    Load => "LOAD",
    Store => "STORE",
    Barrier => "BARRIER",
    AtomUadd => "ATOMUADD",
    AtomXchg => "ATOMXCHG",
    AtomCas => "ATOMCAS",
    AtomAnd => "ATOMAND",
    AtomOr => "ATOMOR",
    AtomXor => "ATOMXOR",
    AtomUmin => "ATOMUMIN",
    AtomUmax => "ATOMUMAX",
    AtomImin => "ATOMIMIN",
    AtomImax => "ATOMIMAX",
    Tex2 => "TEX2",
    Txb2 => "TXB2",
    Txl2 => "TXL2",
    ImulHi => "IMUL_HI",
    UmulHi => "UMUL_HI",
    Tg4 => "TG4",
    Lodq => "LODQ",
    Ibfe => "IBFE",
    Ubfe => "UBFE",
    Bfi => "BFI",
    Brev => "BREV",
    Popc => "POPC",
    Lsb => "LSB",
    Imsb => "IMSB",
    Umsb => "UMSB",
    InterpCentroid => "INTERP_CENTROID",
    InterpSample => "INTERP_SAMPLE",
    InterpOffset => "INTERP_OFFSET",
    F2d => "F2D",
    D2f => "D2F",
    Dabs => "DABS",
    Dneg => "DNEG",
    Dadd => "DADD",
    Dmul => "DMUL",
    Dmax => "DMAX",
    Dmin => "DMIN",
    Dslt => "DSLT",
    Dsge => "DSGE",
    Dseq => "DSEQ",
    Dsne => "DSNE",
    Drcp => "DRCP",
    Dsqrt => "DSQRT",
    Dmad => "DMAD",
    Dfma => "DFMA",
    Dfrac => "DFRAC",
    Dldexp => "DLDEXP",
    Dfracexp => "DFRACEXP",
    D2i => "D2I",
    I2d => "I2D",
    D2u => "D2U",
    U2d => "U2D",
    Drsq => "DRSQ",
    Dtrunc => "DTRUNC",
    Dceil => "DCEIL",
    Dflr => "DFLR",
    Dround => "DROUND",
    Dssg => "DSSG",
    Ddiv => "DDIV",
    Membar => "MEMBAR",
    Clock => "CLOCK",
    Uarl => "UARL",
    Ucmp => "UCMP",
    Iabs => "IABS",
    Issg => "ISSG",
    Fbfetch => "FBFETCH",
}

impl Opcode {
    fn infer_type(self) -> OpcodeType {
        use Opcode::*;
        match self {
            Mov | Ucmp => OpcodeType::Untyped,

            And | Or | Xor | Not | Shl | Txq | Txqs | F2u | Udiv | Umad | Umax | Umin | Umod
            | Umul | Useq | Usge | Ushr | Uslt | Usne | UmulHi | Ubfe | Bfi | Brev | D2u
            | Clock => OpcodeType::Unsigned,

            Arl | Mod | F2i | Fseq | Fsge | Fslt | Fsne | Idiv | Imax | Imin | Ineg | Isge
            | Ishr | Islt | Uadd | Uarl | Iabs | Issg | ImulHi | Ibfe | Imsb | Dseq | Dsge
            | Dslt | Dsne | D2i | Popc | Lsb | Umsb => OpcodeType::Signed,

            Dabs | Dneg | Dadd | Ddiv | Dmul | Dmax | Dmin | Drcp | Dsqrt | Dmad | Dfma
            | Dfrac | Dldexp | Dfracexp | Drsq | Dtrunc | Dceil | Dflr | Dround | Dssg | F2d
            | I2d | U2d => OpcodeType::Double,

            _ => OpcodeType::Float,
        }
    }

    /// Type of the value written to the destination register(s).
    pub fn dst_type(self) -> OpcodeType {
        self.infer_type()
    }

    /// Type the source registers are read as.
    pub fn src_type(self) -> OpcodeType {
        use Opcode::*;
        match self {
            Uif | Txf | U2f | U2d | Uadd | UmulHi | Switch | Case => OpcodeType::Unsigned,
            ImulHi | I2f | I2d => OpcodeType::Signed,
            Arl | F2d | F2i | F2u | Fseq | Fsge | Fslt | Fsne | Ucmp => OpcodeType::Float,
            D2f | D2u | D2i | Dseq | Dsge | Dslt | Dsne => OpcodeType::Double,
            _ => self.infer_type(),
        }
    }

    pub fn is_atomic(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            AtomUadd
                | AtomXchg
                | AtomCas
                | AtomAnd
                | AtomOr
                | AtomXor
                | AtomUmin
                | AtomUmax
                | AtomImin
                | AtomImax
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
