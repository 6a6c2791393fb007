/// Visual boost applied to every rendered bar before clamping.
pub const VISUAL_BOOST: f32 = 1.5;

/// Mean of each of `buckets` contiguous ranges of `samples`.
///
/// Bucket `i` covers `[floor(i*N/B), floor((i+1)*N/B))`, widened to one
/// sample when the range is empty (B > N).
pub fn bucket_means(samples: &[f32], buckets: usize) -> Vec<f32> {
    let n = samples.len();
    if n == 0 || buckets == 0 {
        return Vec::new();
    }
    (0..buckets)
        .map(|i| {
            let start = (i * n / buckets).min(n - 1);
            let end = ((i + 1) * n / buckets).max(start + 1).min(n);
            let chunk = &samples[start..end];
            chunk.iter().sum::<f32>() / chunk.len() as f32
        })
        .collect()
}

/// Bars for display: peak-normalize, bucket, boost, clamp.
///
/// Pure; the same input always renders to the same output.
pub fn render_bars(raw: &[f32], bars: usize) -> Vec<f32> {
    if raw.is_empty() {
        return vec![0.0; bars];
    }
    let peak = raw.iter().copied().fold(0.0f32, f32::max);
    let normalized: Vec<f32> = if peak > 0.0 {
        raw.iter().map(|x| x / peak).collect()
    } else {
        raw.to_vec()
    };
    bucket_means(&normalized, bars)
        .into_iter()
        .map(|v| (v * VISUAL_BOOST).min(1.0))
        .collect()
}
