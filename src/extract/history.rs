//! Scans over Keepa `csv` history rows.
//!
//! A row is flat: `[t0, v0, t1, v1, ...]`, or `[t0, v0, s0, t1, v1, s1, ...]`
//! for price types that also carry shipping. Times are Keepa minutes and a
//! value of `-1` means "no offer" for that span.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub minute: i64,
    pub value: i64,
}

/// Split a raw row into points. A trailing partial record is dropped.
pub fn points(raw: &[i64], stride: usize) -> Vec<Point> {
    if stride < 2 {
        return Vec::new();
    }
    raw.chunks_exact(stride)
        .map(|c| Point {
            minute: c[0],
            value: c[1],
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lowest,
    Highest,
}

/// Lowest or highest positive value, optionally only from `since` onward
pub fn extreme(points: &[Point], bound: Bound, since: Option<i64>) -> Option<i64> {
    let values = points
        .iter()
        .filter(|p| p.value > 0)
        .filter(|p| since.map(|s| p.minute >= s).unwrap_or(true))
        .map(|p| p.value);

    match bound {
        Bound::Lowest => values.min(),
        Bound::Highest => values.max(),
    }
}

/// Time-weighted mean of positive values over `[from, to]`.
///
/// The value in force at `from` is the last point before it. Spans with
/// no offer count toward neither the sum nor the weight.
pub fn weighted_average(points: &[Point], from: i64, to: i64) -> Option<i64> {
    if to <= from || points.is_empty() {
        return None;
    }

    let mut total = 0f64;
    let mut weight = 0f64;

    for (i, point) in points.iter().enumerate() {
        let end = points.get(i + 1).map(|next| next.minute).unwrap_or(to);
        let start = point.minute.max(from);
        let end = end.min(to);

        if end <= start || point.value <= 0 {
            continue;
        }

        let span = (end - start) as f64;
        total += point.value as f64 * span;
        weight += span;
    }

    if weight > 0.0 {
        Some((total / weight).round() as i64)
    } else {
        None
    }
}

/// Number of rank improvements (a lower positive rank than the previous
/// positive rank) recorded from `since` onward.
pub fn count_drops(points: &[Point], since: i64) -> i64 {
    let mut previous: Option<i64> = None;
    let mut drops = 0;

    for point in points.iter().filter(|p| p.value > 0) {
        if let Some(prev) = previous {
            if point.minute >= since && point.value < prev {
                drops += 1;
            }
        }
        previous = Some(point.value);
    }

    drops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_with_shipping_stride() {
        let raw = [100, 1500, 399, 200, 1400, 0, 300];
        let pts = points(&raw, 3);
        assert_eq!(
            pts,
            vec![
                Point { minute: 100, value: 1500 },
                Point { minute: 200, value: 1400 },
            ]
        );
        assert!(points(&raw, 1).is_empty());
    }

    #[test]
    fn test_extreme_ignores_sentinels_and_respects_cutoff() {
        let pts = points(&[100, 900, 200, -1, 300, 1200, 400, 1000], 2);
        assert_eq!(extreme(&pts, Bound::Lowest, None), Some(900));
        assert_eq!(extreme(&pts, Bound::Highest, None), Some(1200));
        assert_eq!(extreme(&pts, Bound::Lowest, Some(250)), Some(1000));
        assert_eq!(extreme(&pts, Bound::Highest, Some(500)), None);
    }

    #[test]
    fn test_weighted_average() {
        // 1000 for 10 minutes, 2000 for 30 minutes
        let pts = points(&[0, 1000, 10, 2000], 2);
        assert_eq!(weighted_average(&pts, 0, 40), Some(1750));

        // Window opening mid-span takes the value in force
        assert_eq!(weighted_average(&pts, 5, 10), Some(1000));
    }

    #[test]
    fn test_weighted_average_skips_out_of_stock() {
        let pts = points(&[0, 1000, 10, -1, 20, 3000], 2);
        assert_eq!(weighted_average(&pts, 0, 30), Some(2000));
        assert_eq!(weighted_average(&pts, 10, 20), None);
        assert_eq!(weighted_average(&pts, 30, 30), None);
    }

    #[test]
    fn test_count_drops() {
        let pts = points(&[0, 5000, 10, 4000, 20, -1, 30, 4500, 40, 3000], 2);
        assert_eq!(count_drops(&pts, 0), 2);
        assert_eq!(count_drops(&pts, 35), 1);
        assert_eq!(count_drops(&[], 0), 0);
    }
}
