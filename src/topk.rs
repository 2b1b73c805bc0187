//! Top-k selection over a distance matrix.
//!
//! Given a row of `m` distances, produce the `k` smallest in ascending
//! order along with their column indices, padding with `(-1.0, -1)`
//! sentinels when `k > m`. Ties resolve to the smaller column index,
//! by sorting the `(distance, index)` pair rather than distance alone.

/// For each of the `n` rows in `dist` (shaped `n x m`), writes the `k`
/// smallest distances (ascending) and their column indices into
/// `out_dist`/`out_idx` (each shaped `n x k`).
///
/// Surplus slots when `k > m` are filled with `(-1.0, -1)`.
///
/// # Panics
///
/// Panics if `dist.len() != n * m` or `out_dist`/`out_idx` are not
/// shaped `n * k`.
pub fn find_top_k(k: usize, n: usize, m: usize, dist: &[f32], out_idx: &mut [i64], out_dist: &mut [f32]) {
    assert_eq!(dist.len(), n * m, "dist has the wrong shape");
    assert_eq!(out_idx.len(), n * k, "out_idx has the wrong shape");
    assert_eq!(out_dist.len(), n * k, "out_dist has the wrong shape");

    let mut row: Vec<(f32, i64)> = Vec::with_capacity(m);
    for i in 0..n {
        row.clear();
        row.extend(
            dist[i * m..(i + 1) * m]
                .iter()
                .enumerate()
                .map(|(j, &d)| (d, j as i64)),
        );

        let cmp = |a: &(f32, i64), b: &(f32, i64)| {
            a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1))
        };

        if k < m {
            let split = k.min(row.len());
            if split > 0 {
                row.select_nth_unstable_by(split - 1, cmp);
            }
            row[..split].sort_unstable_by(cmp);
        } else {
            row.sort_unstable_by(cmp);
        }

        let out_base = i * k;
        let filled = row.len().min(k);
        for j in 0..filled {
            out_dist[out_base + j] = row[j].0;
            out_idx[out_base + j] = row[j].1;
        }
        for j in filled..k {
            out_dist[out_base + j] = -1.0;
            out_idx[out_base + j] = -1;
        }
    }
}
