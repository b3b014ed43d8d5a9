use core::time::Duration;

/// Trait for types having a constant default value. This is essentially a
/// constant version of `Default`.
///
/// Configuration types implement this so that they can be built in a
/// `const` context starting from their defaults.
pub trait Init {
    /// The default value.
    const INIT: Self;
}

impl<T> Init for Option<T> {
    const INIT: Self = None;
}

impl Init for Duration {
    const INIT: Self = Duration::ZERO;
}

macro_rules! impl_init_zero {
    ($($ty:ty),* $(,)*) => {
        $(
            impl Init for $ty {
                const INIT: Self = 0;
            }
        )*
    };
}

impl_init_zero!(u8, u16, u32, u64, usize, i32);

impl Init for bool {
    const INIT: Self = false;
}
