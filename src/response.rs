//! Conversion of response data into the floating-point values used by IRLS.

/// Describes the domain of a response variable. Implementing this trait for
/// a type Y shows how to convert it to a floating point value and allows that
/// type to be used as the response of a logistic regression. Whether the
/// converted value is admissible is checked by the family.
pub trait Response {
    /// Converts the domain to a floating-point value for IRLS.
    fn to_float(self) -> f64;
}

impl Response for bool {
    fn to_float(self) -> f64 {
        if self {
            1.
        } else {
            0.
        }
    }
}

impl Response for f64 {
    fn to_float(self) -> f64 {
        self
    }
}

impl Response for f32 {
    fn to_float(self) -> f64 {
        f64::from(self)
    }
}

// Integer responses are converted exactly for all 0/1 values; larger counts
// are converted with the usual rounding of `as`.
macro_rules! impl_int_response {
    ($($t:ty),*) => {
        $(
            impl Response for $t {
                fn to_float(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_int_response!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);
