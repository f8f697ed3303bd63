#[macro_export]
macro_rules! const_assert {
    ($check:expr $(,$msg:tt)*) => {
        const _: () = assert!($check $(,$msg)*);
    };
}

#[macro_export]
macro_rules! size_of {
    ($t:ty) => {
        ::core::mem::size_of::<$t>()
    };
}

#[macro_export]
macro_rules! align_of {
    ($t:ty) => {
        ::core::mem::align_of::<$t>()
    };
}
