//! Bounded scalar minimization (Brent's method).

const GOLDEN: f64 = 0.381_966_011_250_105_1;
const SQRT_EPS: f64 = 1.490_116_119_384_765_6e-8;
const MAX_ITERATIONS: usize = 500;

/// Minimize `f` on `[a, b]` to absolute tolerance `xatol`.
///
/// Combines golden-section steps with parabolic interpolation. Returns the abscissa
/// of the minimum; the endpoints themselves are never evaluated.
pub fn minimize_bounded<F>(mut f: F, a: f64, b: f64, xatol: f64) -> f64
where
    F: FnMut(f64) -> f64,
{
    let (mut a, mut b) = if a <= b { (a, b) } else { (b, a) };

    let mut x = a + GOLDEN * (b - a);
    let (mut v, mut w) = (x, x);
    let mut fx = f(x);
    let (mut fv, mut fw) = (fx, fx);
    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    for _ in 0..MAX_ITERATIONS {
        let xm = 0.5 * (a + b);
        let tol1 = SQRT_EPS * x.abs() + xatol / 3.0;
        let tol2 = 2.0 * tol1;
        if (x - xm).abs() <= tol2 - 0.5 * (b - a) {
            break;
        }

        let mut golden = true;
        if e.abs() > tol1 {
            let mut r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = d;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - x) && p < q * (b - x) {
                d = p / q;
                let u = x + d;
                if (u - a) < tol2 || (b - u) < tol2 {
                    d = tol1.copysign(xm - x);
                }
                golden = false;
            }
        }
        if golden {
            e = if x >= xm { a - x } else { b - x };
            d = GOLDEN * e;
        }

        let u = x + if d.abs() >= tol1 { d } else { tol1.copysign(d) };
        let fu = f(u);

        if fu <= fx {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            (v, fv) = (w, fw);
            (w, fw) = (x, fx);
            (x, fx) = (u, fu);
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                (v, fv) = (w, fw);
                (w, fw) = (u, fu);
            } else if fu <= fv || v == x || v == w {
                (v, fv) = (u, fu);
            }
        }
    }

    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_interior_minimum() {
        let x = minimize_bounded(|x| (x - 1.3).powi(2) + 2.0, -5.0, 5.0, 1e-10);
        assert!((x - 1.3).abs() < 1e-7);
    }

    #[test]
    fn finds_maximum_of_sine_via_negation() {
        let x = minimize_bounded(|x: f64| -x.sin(), 0.0, 3.0, 1e-12);
        assert!((x - std::f64::consts::FRAC_PI_2).abs() < 1e-7);
    }

    #[test]
    fn monotone_function_converges_to_bound() {
        let x = minimize_bounded(|x| x, 2.0, 4.0, 1e-9);
        assert!((x - 2.0).abs() < 1e-6);
    }
}
