//! The AstroBWT v3 opcode table.
//!
//! Every opcode is four byte-wise primitives applied in order. The table
//! packs an opcode into a `u16`: four 4-bit primitive indices, the high
//! nibble runs first. The rows are consensus data and must never change.

use crate::core::params::SUB_XOR_LITERAL;

/// One of the sixteen byte operations an opcode is built from.
///
/// `pivot` is the byte at the upper end of the mutated window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Primitive {
    /// x + x
    AddSelf = 0x0,
    /// x - (x ^ 97)
    SubXor97 = 0x1,
    /// x * x
    MulSelf = 0x2,
    /// x ^ pivot
    XorPivot = 0x3,
    /// !x
    Not = 0x4,
    /// x & pivot
    AndPivot = 0x5,
    /// x << (x & 3)
    ShlSelf3 = 0x6,
    /// x >> (x & 3)
    ShrSelf3 = 0x7,
    /// bit reversal
    Reverse = 0x8,
    /// x ^ popcount(x)
    XorPopcount = 0x9,
    /// rotate left by x (mod 8)
    RolX = 0xA,
    RolOne = 0xB,
    /// x ^ rotl(x, 2)
    XorRolTwo = 0xC,
    RolThree = 0xD,
    /// x ^ rotl(x, 4)
    XorRolFour = 0xE,
    RolFive = 0xF,
}

impl Primitive {
    pub const ALL: [Primitive; 16] = [
        Primitive::AddSelf,
        Primitive::SubXor97,
        Primitive::MulSelf,
        Primitive::XorPivot,
        Primitive::Not,
        Primitive::AndPivot,
        Primitive::ShlSelf3,
        Primitive::ShrSelf3,
        Primitive::Reverse,
        Primitive::XorPopcount,
        Primitive::RolX,
        Primitive::RolOne,
        Primitive::XorRolTwo,
        Primitive::RolThree,
        Primitive::XorRolFour,
        Primitive::RolFive,
    ];

    /// Decode a 4-bit table entry.
    #[inline(always)]
    pub fn from_nibble(nibble: u8) -> Self {
        Self::ALL[(nibble & 0xF) as usize]
    }

    #[inline(always)]
    pub fn apply(self, x: u8, pivot: u8) -> u8 {
        match self {
            Primitive::AddSelf => x.wrapping_add(x),
            Primitive::SubXor97 => x.wrapping_sub(x ^ SUB_XOR_LITERAL),
            Primitive::MulSelf => x.wrapping_mul(x),
            Primitive::XorPivot => x ^ pivot,
            Primitive::Not => !x,
            Primitive::AndPivot => x & pivot,
            Primitive::ShlSelf3 => x << (x & 3),
            Primitive::ShrSelf3 => x >> (x & 3),
            Primitive::Reverse => x.reverse_bits(),
            Primitive::XorPopcount => x ^ x.count_ones() as u8,
            // rotate_left reduces the count mod 8
            Primitive::RolX => x.rotate_left(x as u32),
            Primitive::RolOne => x.rotate_left(1),
            Primitive::XorRolTwo => x ^ x.rotate_left(2),
            Primitive::RolThree => x.rotate_left(3),
            Primitive::XorRolFour => x ^ x.rotate_left(4),
            Primitive::RolFive => x.rotate_left(5),
        }
    }
}

/// Opcode whose inner loop also swaps and bit-reverses the window ends
pub const OP_SWAP_ENDS: u8 = 0;

/// Opcode that refreshes the mixer with XXH64 after every element
pub const OP_XXH_EVERY_STEP: u8 = 253;

/// Opcodes that re-key RC4 from the mutation buffer before running
pub fn rekeys_rc4(op: u8) -> bool {
    op >= 254
}

static OPCODES: [u16; 256] = [
    0x9F2A, 0x6B50, 0x9869, 0xAD3B, 0x47A1, 0x9367, 0x6D41, 0x0A94,
    0x4FF6, 0x3E7C, 0x42D2, 0xBF5A, 0xC2C4, 0xB37F, 0x7626, 0xC651,
    0xE2B4, 0x32F4, 0xEDBF, 0x1F60, 0x538C, 0xB305, 0x682B, 0xDB95,
    0x07EF, 0x9DA1, 0x2908, 0xF5EF, 0x600F, 0x2370, 0x5EF6, 0x4C62,
    0xC8DC, 0xAE82, 0x1661, 0x04B3, 0x9BCB, 0xA772, 0x7D9A, 0xC375,
    0xA393, 0xF1DE, 0xBDCA, 0x5051, 0x99DA, 0xFF59, 0x90FE, 0xF5F6,
    0xA44F, 0x908E, 0x8D0B, 0x3EEF, 0xA749, 0x09EE, 0x8344, 0x8EEB,
    0xC24B, 0xAFD8, 0x8C50, 0xB2A4, 0x342D, 0xF6DF, 0x54C0, 0xF910,
    0x38E2, 0xFDC2, 0xC8EB, 0xB9CF, 0x54E3, 0x0287, 0x327E, 0xF426,
    0x8936, 0x98F1, 0x2D85, 0x295E, 0xACF7, 0xD069, 0xA821, 0xEC02,
    0xA605, 0xE6A9, 0x3447, 0x68D8, 0x1B60, 0x73A6, 0xEAE4, 0x0DE0,
    0xCB24, 0x024C, 0x8FB7, 0x95E8, 0x9495, 0xC250, 0xBA56, 0xB4FF,
    0xCC9B, 0xB697, 0xE67E, 0xE187, 0xA689, 0x7974, 0xD10D, 0xB83A,
    0x89F0, 0x6DAC, 0x8EB2, 0x7CFB, 0x345C, 0x2A3C, 0x0CC7, 0x2827,
    0xD4F1, 0xFB94, 0xB8A4, 0xAF5D, 0x5396, 0x6D65, 0x706F, 0x8C43,
    0xC238, 0x7092, 0xEAFC, 0x54DD, 0xCC34, 0x8C07, 0xDBF8, 0x6253,
    0xACCF, 0x4997, 0x7ABE, 0x1B92, 0x58FC, 0x3FC6, 0x4EB5, 0x7C08,
    0x713F, 0xF78A, 0x3301, 0xFDCD, 0xBC3F, 0xB190, 0x5F8C, 0x5D76,
    0xA64A, 0x8ECE, 0x5659, 0x46E2, 0x5F61, 0x3810, 0x6665, 0x0626,
    0x746C, 0xBD44, 0xF439, 0x1393, 0x77DB, 0x76AB, 0x9D0B, 0x13A3,
    0x78BD, 0x33FA, 0x28C1, 0x61EB, 0x2914, 0xE360, 0xD0C4, 0x4427,
    0xA5AB, 0xB6E5, 0x1812, 0xD198, 0xE16B, 0x4620, 0x4A99, 0xD12F,
    0x323F, 0x9CC5, 0x504B, 0xC078, 0x7E31, 0x46CF, 0x3BFE, 0x0112,
    0x62F3, 0x4EF7, 0xCE17, 0x340D, 0xE9EE, 0xFE31, 0xF75C, 0x0DA7,
    0x0602, 0x56AB, 0x5A65, 0x9C3E, 0xD86B, 0xEA22, 0x778B, 0x4023,
    0x7988, 0xDCE4, 0x34AF, 0x35BA, 0xFCA3, 0x9E60, 0xE889, 0xFD99,
    0x007D, 0xF891, 0xCAF4, 0xE01A, 0xAC33, 0x06D1, 0x3174, 0x3562,
    0xA415, 0xF0BE, 0x8421, 0xED58, 0xB686, 0xF348, 0x7632, 0xD3A1,
    0xCBD6, 0x478D, 0x8123, 0x4615, 0x0709, 0xDAC9, 0x25AA, 0xD738,
    0x22EF, 0xB9D9, 0x5273, 0xC2D4, 0x3051, 0xF6CD, 0x00D1, 0xFB25,
    0x4056, 0xE93B, 0x0013, 0xFC9B, 0x4C8F, 0x1FC7, 0x0B70, 0xFCF4,
    0x419F, 0x8EEA, 0x5A9E, 0x098C, 0x8EC6, 0xDC3D, 0x9DCD, 0x9DCD,
];

/// The four primitives of `op`, in execution order.
pub fn program(op: u8) -> [Primitive; 4] {
    let code = OPCODES[op as usize];
    [
        Primitive::from_nibble((code >> 12) as u8),
        Primitive::from_nibble((code >> 8) as u8),
        Primitive::from_nibble((code >> 4) as u8),
        Primitive::from_nibble(code as u8),
    ]
}

/// Run opcode `op` on one byte.
#[inline(always)]
pub fn execute(op: u8, x: u8, pivot: u8) -> u8 {
    let code = OPCODES[op as usize];
    let mut x = x;
    for shift in [12u32, 8, 4, 0] {
        x = Primitive::from_nibble((code >> shift) as u8).apply(x, pivot);
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use Primitive::*;

    #[test]
    fn test_nibble_roundtrip() {
        for (i, p) in Primitive::ALL.iter().enumerate() {
            assert_eq!(*p as u8, i as u8);
            assert_eq!(Primitive::from_nibble(i as u8), *p);
        }
    }

    #[test]
    fn test_primitive_semantics() {
        assert_eq!(AddSelf.apply(0x81, 0), 0x02);
        assert_eq!(SubXor97.apply(0, 0), 0x9F); // 0 - 97
        assert_eq!(MulSelf.apply(16, 0), 0);
        assert_eq!(XorPivot.apply(0xF0, 0x3C), 0xCC);
        assert_eq!(Not.apply(0x0F, 0), 0xF0);
        assert_eq!(AndPivot.apply(0xF0, 0x3C), 0x30);
        assert_eq!(ShlSelf3.apply(0xC3, 0), 0x18); // shift by 3
        assert_eq!(ShrSelf3.apply(0xC3, 0), 0x18);
        assert_eq!(Reverse.apply(0x01, 0), 0x80);
        assert_eq!(XorPopcount.apply(0xFF, 0), 0xF7);
        assert_eq!(RolOne.apply(0x80, 0), 0x01);
        assert_eq!(XorRolTwo.apply(0x01, 0), 0x05);
        assert_eq!(RolThree.apply(0x20, 0), 0x01);
        assert_eq!(XorRolFour.apply(0x12, 0), 0x33);
        assert_eq!(RolFive.apply(0x08, 0), 0x01);
    }

    #[test]
    fn test_rotate_by_self_reduces_mod_8() {
        // 9 & 7 == 1
        assert_eq!(RolX.apply(9, 0), 18);
        // 0x88 = 136, 136 % 8 == 0
        assert_eq!(RolX.apply(0x88, 0), 0x88);
        for x in 0..=255u8 {
            assert_eq!(RolX.apply(x, 0), x.rotate_left((x % 8) as u32));
        }
    }

    #[test]
    fn test_known_rows() {
        assert_eq!(program(0), [XorPopcount, RolFive, MulSelf, RolX]);
        assert_eq!(program(1), [ShlSelf3, RolOne, AndPivot, AddSelf]);
        assert_eq!(program(253), [RolThree, XorRolTwo, XorPivot, RolThree]);
        assert_eq!(program(254), [XorPopcount, RolThree, XorRolTwo, RolThree]);
        assert_eq!(program(255), program(254));
    }

    #[test]
    fn test_execute_matches_program() {
        for op in 0..=255u8 {
            let steps = program(op);
            for x in (0..=255u8).step_by(7) {
                let pivot = x.wrapping_mul(31).wrapping_add(op);
                let expected = steps.iter().fold(x, |acc, p| p.apply(acc, pivot));
                assert_eq!(execute(op, x, pivot), expected, "op {op} x {x}");
            }
        }
    }

    #[test]
    fn test_opcode_zero_never_reads_pivot() {
        // The swap in opcode 0 rewrites the pivot mid-window; its primitives must not care.
        for x in 0..=255u8 {
            assert_eq!(execute(OP_SWAP_ENDS, x, 0), execute(OP_SWAP_ENDS, x, 0xFF));
        }
    }

    #[test]
    fn test_rekey_opcodes() {
        assert!(rekeys_rc4(254));
        assert!(rekeys_rc4(255));
        assert!(!rekeys_rc4(OP_XXH_EVERY_STEP));
    }
}
