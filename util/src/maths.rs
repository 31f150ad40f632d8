//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Arithmetic mean of the values, or `None` if there are no values.
pub fn mean<T>(values: &[T]) -> Option<T>
where
    T: Float,
{
    if values.is_empty() {
        return None;
    }

    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);

    T::from(values.len()).map(|n| sum / n)
}

/// Population standard deviation of the values, or `None` if there are no
/// values.
///
/// The population form (dividing by `N`, not `N - 1`) is used so that the
/// result matches the usual numerical library default.
pub fn std_dev<T>(values: &[T]) -> Option<T>
where
    T: Float,
{
    let mu = mean(values)?;

    let sum_sq = values
        .iter()
        .fold(T::zero(), |acc, &v| acc + (v - mu).powi(2));

    T::from(values.len()).map(|n| (sum_sq / n).sqrt())
}

/// Direction of a value, `-1` for strictly negative values, `+1` otherwise.
///
/// Unlike `Float::signum` zero maps to `+1`, and there is no `NaN` case to
/// handle.
pub fn direction<T>(value: T) -> T
where
    T: Float,
{
    if value < T::zero() {
        -T::one()
    } else {
        T::one()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean::<f64>(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev::<f64>(&[]), None);
        assert_eq!(std_dev(&[4.0, 4.0, 4.0]), Some(0.0));

        // Population std dev of this set is exactly 2
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.0f64).abs() < 1e-12);
    }

    #[test]
    fn test_direction() {
        assert_eq!(direction(-0.3f64), -1.0);
        assert_eq!(direction(0.0f64), 1.0);
        assert_eq!(direction(2.0f64), 1.0);
    }
}
