/// The primitive kinds a typed array can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Byte,
    Short,
    Long,
    Double,
}

impl ElementKind {
    pub const fn bytes_per_element(self) -> usize {
        match self {
            ElementKind::Byte => 1,
            ElementKind::Short => 2,
            ElementKind::Long | ElementKind::Double => 8,
        }
    }
}

/// A fixed-width element with a big-endian wire encoding.
///
/// `encode_be`/`decode_be` operate on exactly [`Element::BYTES`] bytes.
pub trait Element: Copy + Default + Send + Sync + std::fmt::Debug + 'static {
    const KIND: ElementKind;
    const BYTES: usize;

    fn encode_be(self, out: &mut [u8]);
    fn decode_be(bytes: &[u8]) -> Self;

    /// Bitwise equality (so `NaN` payloads compare equal to themselves).
    fn same_bits(self, other: Self) -> bool;
}

macro_rules! int_element {
    ($ty:ty, $kind:expr) => {
        impl Element for $ty {
            const KIND: ElementKind = $kind;
            const BYTES: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn encode_be(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_be_bytes());
            }

            #[inline]
            fn decode_be(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(bytes);
                <$ty>::from_be_bytes(buf)
            }

            #[inline]
            fn same_bits(self, other: Self) -> bool {
                self == other
            }
        }
    };
}

int_element!(u8, ElementKind::Byte);
int_element!(i8, ElementKind::Byte);
int_element!(i16, ElementKind::Short);
int_element!(u16, ElementKind::Short);
int_element!(i64, ElementKind::Long);
int_element!(u64, ElementKind::Long);

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Double;
    const BYTES: usize = 8;

    #[inline]
    fn encode_be(self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_bits().to_be_bytes());
    }

    #[inline]
    fn decode_be(bytes: &[u8]) -> Self {
        f64::from_bits(u64::decode_be(bytes))
    }

    #[inline]
    fn same_bits(self, other: Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}
