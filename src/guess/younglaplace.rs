//! Initial Young–Laplace parameters for a pendant drop contour.

use tracing::debug;

use crate::domain::{Vector2, YoungLaplaceParams};
use crate::error::FitError;
use crate::guess::{bond_selected_plane, find_pendant_apex};

/// Apex, radius and rotation from [`find_pendant_apex`], Bond number from the selected
/// plane.
pub fn young_laplace_guess(data: &[Vector2]) -> Result<YoungLaplaceParams, FitError> {
    FitError::check_len(data.len(), YoungLaplaceParams::LEN)?;
    let apex = find_pendant_apex(data)?;
    let bond = bond_selected_plane(data, &apex);

    let guess = YoungLaplaceParams {
        bond,
        radius: apex.radius,
        apex_x: apex.apex.x,
        apex_y: apex.apex.y,
        rotation: apex.rotation,
    };
    debug!(?guess, "young-laplace guess");
    Ok(guess)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{drop_profile, linspace};
    use crate::math::wrap_angle;

    #[test]
    fn guess_is_close_to_truth() {
        let truth = YoungLaplaceParams {
            bond: 0.2,
            radius: 40.0,
            apex_x: 320.0,
            apex_y: 240.0,
            rotation: 0.1,
        };
        let data = drop_profile(&truth, &linspace(-3.0, 3.0, 400));
        let guess = young_laplace_guess(&data).unwrap();
        assert!(guess.apex().distance(truth.apex()) < 4.0);
        assert!((guess.radius - truth.radius).abs() < 6.0);
        assert!(wrap_angle(guess.rotation - truth.rotation).abs() < 0.15);
        assert!(guess.bond > 0.0 && guess.bond < 0.5);
    }

    #[test]
    fn empty_input() {
        assert_eq!(young_laplace_guess(&[]), Err(FitError::EmptyInput));
    }
}
