//! Special functions behind the hydrogen wavefunction.
//! All evaluations are iterative; nothing here recurses.

/// n! as a float. Returns 1 for n <= 1.
pub fn factorial(n: u32) -> f64 {
    (2..=n).fold(1.0, |acc, k| acc * k as f64)
}

/// Double factorial n!! = n * (n-2) * (n-4) * ... down to 1 or 2
pub fn double_factorial(n: u32) -> f64 {
    let mut result = 1.0;
    let mut i = n;

    while i > 1 {
        result *= i as f64;
        i -= 2;
    }

    result
}

/// Generalized Laguerre polynomial L^alpha_p(x) via the three-term forward recurrence:
/// L_0 = 1, L_1 = 1 + alpha - x,
/// L_k = ((2k - 1 + alpha - x) L_{k-1} - (k - 1 + alpha) L_{k-2}) / k
pub fn laguerre(p: u32, alpha: f64, x: f64) -> f64 {
    if p == 0 {
        return 1.0;
    }

    let mut l0 = 1.0;
    let mut l1 = 1.0 + alpha - x;

    for k in 2..=p {
        let k_f = k as f64;
        let l_new = ((2.0 * k_f - 1.0 + alpha - x) * l1 - (k_f - 1.0 + alpha) * l0) / k_f;
        l0 = l1;
        l1 = l_new;
    }

    l1
}

/// Associated Legendre polynomial P^m_l(x) for x in [-1, 1], Condon-Shortley phase included.
/// `m` is folded to |m| first; returns 0 when |m| > l.
pub fn associated_legendre(l: u32, m: i32, x: f64) -> f64 {
    let m = m.unsigned_abs();
    if m > l {
        return 0.0;
    }

    // P^m_m = (-1)^m (2m-1)!! (1 - x^2)^(m/2)
    let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
    let pmm = sign
        * double_factorial((2 * m).saturating_sub(1))
        * (1.0 - x * x).max(0.0).powf(m as f64 / 2.0);

    if l == m {
        return pmm;
    }

    let m_f = m as f64;
    let pm1m = x * (2.0 * m_f + 1.0) * pmm;

    if l == m + 1 {
        return pm1m;
    }

    // Upward recurrence in degree
    let mut p_prev = pmm;
    let mut p_curr = pm1m;

    for k in (m + 2)..=l {
        let k_f = k as f64;
        let p_next = (x * (2.0 * k_f - 1.0) * p_curr - (k_f + m_f - 1.0) * p_prev) / (k_f - m_f);
        p_prev = p_curr;
        p_curr = p_next;
    }

    p_curr
}
