//! GLSL type constructors and bit reinterpretation casts.
//!
//! TGSI registers are untyped 32-bit lanes and every GLSL temporary is a
//! `vec4`, so nearly every emitted expression is wrapped in one constructor
//! and one bit cast from this table.

use core::fmt::{self, Write};

use vrend_tgsi::WriteMask;

/// Type constructor or bit cast applied around an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeQualifier {
    /// No wrapping function.
    #[default]
    None,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Uint,
    UVec2,
    UVec3,
    UVec4,
    FloatBitsToUint,
    UintBitsToFloat,
    FloatBitsToInt,
    IntBitsToFloat,
    Double,
    DVec2,
}

impl TypeQualifier {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeQualifier::None => "",
            TypeQualifier::Float => "float",
            TypeQualifier::Vec2 => "vec2",
            TypeQualifier::Vec3 => "vec3",
            TypeQualifier::Vec4 => "vec4",
            TypeQualifier::Int => "int",
            TypeQualifier::IVec2 => "ivec2",
            TypeQualifier::IVec3 => "ivec3",
            TypeQualifier::IVec4 => "ivec4",
            TypeQualifier::Uint => "uint",
            TypeQualifier::UVec2 => "uvec2",
            TypeQualifier::UVec3 => "uvec3",
            TypeQualifier::UVec4 => "uvec4",
            TypeQualifier::FloatBitsToUint => "floatBitsToUint",
            TypeQualifier::UintBitsToFloat => "uintBitsToFloat",
            TypeQualifier::FloatBitsToInt => "floatBitsToInt",
            TypeQualifier::IntBitsToFloat => "intBitsToFloat",
            TypeQualifier::Double => "double",
            TypeQualifier::DVec2 => "dvec2",
        }
    }

    /// `float`..`vec4` for 1..=4 components.
    pub fn float_vec(components: usize) -> Self {
        match components {
            0 | 1 => TypeQualifier::Float,
            2 => TypeQualifier::Vec2,
            3 => TypeQualifier::Vec3,
            _ => TypeQualifier::Vec4,
        }
    }

    /// `int`..`ivec4` for 1..=4 components.
    pub fn int_vec(components: usize) -> Self {
        match components {
            0 | 1 => TypeQualifier::Int,
            2 => TypeQualifier::IVec2,
            3 => TypeQualifier::IVec3,
            _ => TypeQualifier::IVec4,
        }
    }

    /// `uint`..`uvec4` for 1..=4 components.
    pub fn uint_vec(components: usize) -> Self {
        match components {
            0 | 1 => TypeQualifier::Uint,
            2 => TypeQualifier::UVec2,
            3 => TypeQualifier::UVec3,
            _ => TypeQualifier::UVec4,
        }
    }
}

impl fmt::Display for TypeQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Swizzle suffix for the few write masks a query result is narrowed to.
pub fn writemask_suffix(mask: WriteMask) -> &'static str {
    match mask.0 {
        0b0000 => "",
        0b0001 => ".x",
        0b0011 => ".xy",
        0b0111 => ".xyz",
        0b1000 => ".w",
        _ => "",
    }
}

/// Destination swizzle (`.xz`) for a partial write mask, empty when full.
pub fn writemask_swizzle(mask: WriteMask) -> String {
    if mask.is_full() {
        return String::new();
    }
    let mut s = String::from(".");
    for (bit, c) in [(1u8, 'x'), (2, 'y'), (4, 'z'), (8, 'w')] {
        if mask.contains(bit) {
            s.push(c);
        }
    }
    s
}

pub fn swizzle_char(component: u8) -> char {
    match component {
        0 => 'x',
        1 => 'y',
        2 => 'z',
        _ => 'w',
    }
}

/// Formats `value` like C's `%.8g`.
pub struct Float8g(pub f64);

impl fmt::Display for Float8g {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PRECISION: i32 = 8;
        let v = self.0;
        if v.is_nan() {
            return f.write_str(if v.is_sign_negative() { "-nan" } else { "nan" });
        }
        if v.is_infinite() {
            return f.write_str(if v < 0.0 { "-inf" } else { "inf" });
        }
        if v == 0.0 {
            return f.write_str(if v.is_sign_negative() { "-0" } else { "0" });
        }

        // The exponent after rounding to PRECISION significant digits.
        let sci = format!("{:.*e}", (PRECISION - 1) as usize, v);
        let (mantissa, exp) = match sci.split_once('e') {
            Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
            None => (sci.as_str(), 0),
        };

        if exp < -4 || exp >= PRECISION {
            let mantissa = strip_fraction_zeros(mantissa);
            let sign = if exp < 0 { '-' } else { '+' };
            write!(f, "{mantissa}e{sign}{:02}", exp.abs())
        } else {
            let decimals = (PRECISION - 1 - exp).max(0) as usize;
            let fixed = format!("{:.*}", decimals, v);
            f.write_str(strip_fraction_zeros(&fixed))
        }
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.')
}

/// Formats `value` like C's `%f` (six decimals).
pub fn float6(value: f32) -> String {
    let mut s = String::new();
    let _ = write!(s, "{:.6}", value);
    s
}
