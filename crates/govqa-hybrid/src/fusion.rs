use govqa_core::settings::FusionWeights;

/// `semantic * ws + title * wt + keyword * wk`.
///
/// Weights are validated non-negative, so the result never decreases when
/// any one input grows. The keyword term is additive: a raw boost of 2.0
/// contributes `2.0 * wk` regardless of the other signals.
pub fn fuse(weights: &FusionWeights, semantic: f32, title: f32, keyword: f32) -> f32 {
    weights.semantic * semantic + weights.title * title + weights.keyword * keyword
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_weights() {
        let w = FusionWeights::DEFAULT;
        assert!((fuse(&w, 1.0, 1.0, 0.0) - 0.7).abs() < 1e-6);
        assert!((fuse(&w, 0.5, 0.0, 2.0) - 0.85).abs() < 1e-6);
    }

    #[test]
    fn semantic_only_when_other_signals_zero() {
        let w = FusionWeights::TITLE_FOCUSED;
        assert!((fuse(&w, 0.8, 0.0, 0.0) - 0.32).abs() < 1e-6);
    }

    fn weights() -> impl Strategy<Value = FusionWeights> {
        (0.0f32..=0.5, 0.0f32..=0.25, 0.0f32..=0.25).prop_map(|(s, t, k)| FusionWeights { semantic: s, title: t, keyword: k })
    }

    proptest! {
        #[test]
        fn monotone_in_each_signal(
            w in weights(),
            s in -1.0f32..1.0, t in 0.0f32..1.0, k in 0.0f32..10.0,
            ds in 0.0f32..1.0, dt in 0.0f32..1.0, dk in 0.0f32..10.0,
        ) {
            let base = fuse(&w, s, t, k);
            prop_assert!(fuse(&w, s + ds, t, k) >= base);
            prop_assert!(fuse(&w, s, t + dt, k) >= base);
            prop_assert!(fuse(&w, s, t, k + dk) >= base);
        }
    }
}
