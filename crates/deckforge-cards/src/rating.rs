//! Match ranking and skill ratings.
//!
//! Ranking is standard competition ranking (1, 2, 2, 4). Ratings are a
//! Gaussian skill belief per player (mean `mu`, uncertainty `sigma`)
//! updated by paired comparison over adjacent ranked players, in the
//! TrueSkill family. Both are pure functions: the persistence layer calls
//! them at match end and stores the results; nothing here touches live
//! room state.

use serde::{Deserialize, Serialize};

/// Prior skill mean.
pub const DEFAULT_MU: f64 = 25.0;
/// Prior skill uncertainty.
pub const DEFAULT_SIGMA: f64 = DEFAULT_MU / 3.0;
/// Performance variance per comparison.
const BETA: f64 = DEFAULT_SIGMA / 2.0;
/// Per-match dynamics: keeps sigma from collapsing to zero over time.
const TAU: f64 = DEFAULT_SIGMA / 100.0;
/// Assumed probability that two equal players tie.
const DRAW_PROBABILITY: f64 = 0.10;

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Competition ranks for `(id, score)` pairs: descending score, exactly
/// equal scores share a rank, and the next distinct score takes rank
/// `position + 1` (so 1, 2, 2, 4). Ties order by ascending id for a
/// stable output.
pub fn rank_players<I: Ord + Copy>(scores: &[(I, i64)]) -> Vec<(I, u32)> {
    let mut sorted: Vec<(I, i64)> = scores.to_vec();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut ranked = Vec::with_capacity(sorted.len());
    let mut rank = 0u32;
    let mut prev_score = None;
    for (pos, (id, score)) in sorted.into_iter().enumerate() {
        if prev_score != Some(score) {
            rank = pos as u32 + 1;
            prev_score = Some(score);
        }
        ranked.push((id, rank));
    }
    ranked
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

/// A Gaussian skill belief.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub mu: f64,
    pub sigma: f64,
}

impl Default for Rating {
    fn default() -> Self {
        Self { mu: DEFAULT_MU, sigma: DEFAULT_SIGMA }
    }
}

/// A player's match result paired with their current rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedPlayer<I> {
    pub id: I,
    pub rank: u32,
    pub rating: Rating,
}

/// Updates every rating in place from the match result.
///
/// Players are processed in rank order; each adjacent pair contributes one
/// paired-comparison update (a draw update when their ranks are equal).
/// Sigma is inflated by `TAU` once per match before the comparisons, and
/// the comparisons themselves only ever shrink it.
pub fn update_ratings<I: Copy>(players: &mut [RatedPlayer<I>]) {
    players.sort_by_key(|p| p.rank);

    for p in players.iter_mut() {
        let var = p.rating.sigma * p.rating.sigma + TAU * TAU;
        p.rating.sigma = var.sqrt();
    }

    for i in 1..players.len() {
        let (head, tail) = players.split_at_mut(i);
        let draw = head[i - 1].rank == tail[0].rank;
        update_pair(&mut head[i - 1].rating, &mut tail[0].rating, draw);
    }
}

/// One paired-comparison step: `better` ranked above (or tied with)
/// `worse`.
fn update_pair(better: &mut Rating, worse: &mut Rating, draw: bool) {
    let c = (2.0 * BETA * BETA
        + better.sigma * better.sigma
        + worse.sigma * worse.sigma)
        .sqrt();
    let t = (better.mu - worse.mu) / c;
    let eps = draw_margin() / c;

    let (v, w) = if draw { v_w_draw(t, eps) } else { v_w_win(t, eps) };

    let better_var = better.sigma * better.sigma;
    let worse_var = worse.sigma * worse.sigma;

    better.mu += better_var / c * v;
    worse.mu -= worse_var / c * v;
    better.sigma = (better_var * (1.0 - better_var / (c * c) * w)).sqrt();
    worse.sigma = (worse_var * (1.0 - worse_var / (c * c) * w)).sqrt();
}

/// Draw margin for the configured draw probability, one player per side.
fn draw_margin() -> f64 {
    inv_cdf((DRAW_PROBABILITY + 1.0) / 2.0) * std::f64::consts::SQRT_2 * BETA
}

/// Mean/variance multipliers for a decisive comparison.
fn v_w_win(t: f64, eps: f64) -> (f64, f64) {
    let x = t - eps;
    let denom = cdf(x);
    if denom < 1e-12 {
        // Far-tail guard: the limit of v is -x.
        return (-x, 1.0);
    }
    let v = pdf(x) / denom;
    (v, v * (v + x))
}

/// Mean/variance multipliers for a draw.
fn v_w_draw(t: f64, eps: f64) -> (f64, f64) {
    let denom = cdf(eps - t) - cdf(-eps - t);
    if denom < 1e-12 {
        return (if t < 0.0 { 1.0 } else { -1.0 }, 1.0);
    }
    let v = (pdf(-eps - t) - pdf(eps - t)) / denom;
    let w = v * v
        + ((eps - t) * pdf(eps - t) + (eps + t) * pdf(eps + t)) / denom;
    (v, w)
}

// ---------------------------------------------------------------------------
// Gaussian helpers
// ---------------------------------------------------------------------------

fn pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Standard normal CDF via the Abramowitz–Stegun 7.1.26 erf
/// approximation (absolute error below 1.5e-7).
fn cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736
                + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Inverse standard normal CDF (Acklam's rational approximation).
fn inv_cdf(p: f64) -> f64 {
    debug_assert!(p > 0.0 && p < 1.0);

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5])
            * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r
                + 1.0)
    } else {
        -inv_cdf(1.0 - p)
    }
}
