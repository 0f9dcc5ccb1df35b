use num_traits::Float;

/// Median of the samples, averaging the middle pair for even counts.
pub fn median<T: Float>(samples: &[T]) -> Option<T> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        let two = T::one() + T::one();
        Some((sorted[mid - 1] + sorted[mid]) / two)
    }
}

/// First candidate with the smallest absolute distance to `value`.
pub fn nearest<T: Float>(candidates: &[T], value: T) -> Option<T> {
    candidates.iter().copied().fold(None, |best, c| match best {
        Some(b) if (b - value).abs() <= (c - value).abs() => Some(b),
        _ => Some(c),
    })
}

/// Value with the strictly highest occurrence count, `None` on a tie.
pub fn majority<T: Float>(values: &[T]) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();

    for &v in values {
        match counts.iter_mut().find(|(x, _)| *x == v) {
            Some(entry) => entry.1 += 1,
            None => counts.push((v, 1)),
        }
    }

    let top = counts.iter().map(|(_, n)| *n).max()?;
    let mut winners = counts.iter().filter(|(_, n)| *n == top);
    let winner = winners.next()?;

    if winners.next().is_some() {
        None
    } else {
        Some(winner.0)
    }
}
