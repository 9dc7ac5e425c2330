//! Sample-rate conversion.
//!
//! [`resample_poly`] is a rational polyphase resampler: the up/down factors
//! come from the GCD of the two rates, so 44.1kHz to 16kHz is exactly 160/441
//! rather than an approximated float ratio. The anti-aliasing filter is a
//! Kaiser-windowed sinc (beta 5.0, ten zero crossings per side of the wider
//! rate), the same design scipy's `resample_poly` defaults to.

const KAISER_BETA: f64 = 5.0;
const HALF_LEN_FACTOR: usize = 10;

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Zeroth-order modified Bessel function of the first kind.
fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    let mut k = 1.0;
    loop {
        term *= (half / k) * (half / k);
        sum += term;
        if term < sum * 1e-12 {
            break;
        }
        k += 1.0;
    }
    sum
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}

/// Low-pass FIR for an `up`/`down` conversion, with DC gain `up`.
fn design_filter(up: usize, down: usize) -> Vec<f64> {
    let max_rate = up.max(down);
    let cutoff = 1.0 / max_rate as f64;
    let half_len = HALF_LEN_FACTOR * max_rate;
    let taps = 2 * half_len + 1;
    let denom = bessel_i0(KAISER_BETA);

    let mut filter: Vec<f64> = (0..taps)
        .map(|i| {
            let ratio = 2.0 * i as f64 / (taps - 1) as f64 - 1.0;
            let window = bessel_i0(KAISER_BETA * (1.0 - ratio * ratio).max(0.0).sqrt()) / denom;
            cutoff * sinc(cutoff * (i as f64 - half_len as f64)) * window
        })
        .collect();

    let sum: f64 = filter.iter().sum();
    if sum != 0.0 {
        let gain = up as f64 / sum;
        for tap in &mut filter {
            *tap *= gain;
        }
    }
    filter
}

/// Resample `samples` from `from_rate` to `to_rate` with a polyphase filter.
///
/// Output length is `ceil(len * up / down)`. Identical rates or empty input
/// return a copy.
pub fn resample_poly(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let g = gcd(from_rate, to_rate);
    let up = (to_rate / g) as usize;
    let down = (from_rate / g) as usize;
    let filter = design_filter(up, down);
    let half_len = (filter.len() - 1) / 2;

    let n_in = samples.len();
    let n_out = (n_in * up).div_ceil(down);

    (0..n_out)
        .map(|m| {
            // Index into the zero-stuffed upsampled signal, shifted by the
            // filter delay so output stays time-aligned with input.
            let t = m * down + half_len;
            let mut acc = 0.0f64;
            // Only taps landing on a non-zero (original) sample contribute.
            let mut j = t % up;
            while j < filter.len() && j <= t {
                let idx = (t - j) / up;
                if idx < n_in {
                    acc += filter[j] * samples[idx] as f64;
                }
                j += up;
            }
            acc as f32
        })
        .collect()
}

/// Stretch or squeeze `samples` to exactly `target_len` by linear interpolation.
pub fn stretch(samples: &[f32], target_len: usize) -> Vec<f32> {
    if samples.is_empty() || target_len == 0 {
        return Vec::new();
    }
    if target_len == samples.len() {
        return samples.to_vec();
    }

    let ratio = samples.len() as f64 / target_len as f64;
    (0..target_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = (source_pos - source_idx as f64) as f32;

            if source_idx + 1 >= samples.len() {
                samples[samples.len() - 1]
            } else {
                let left = samples[source_idx];
                let right = samples[source_idx + 1];
                left + (right - left) * fraction
            }
        })
        .collect()
}
