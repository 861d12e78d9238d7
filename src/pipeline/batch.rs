/// Split `ids` into contiguous per-worker batches.
///
/// The effective worker count is `min(workers, ids.len())`, so no worker is
/// ever spawned without jobs. Batch size is the ceiling of jobs per
/// effective worker; the last batch may be shorter. Concatenating the
/// batches reproduces `ids` exactly.
pub fn split_into_batches(ids: &[String], workers: usize) -> Vec<Vec<String>> {
    if ids.is_empty() {
        return Vec::new();
    }

    let effective_workers = workers.max(1).min(ids.len());
    let batch_size = ids.len().div_ceil(effective_workers);

    ids.chunks(batch_size).map(|chunk| chunk.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("job-{}", i)).collect()
    }

    #[test]
    fn ten_jobs_three_workers_split_four_four_two() {
        let batches = split_into_batches(&ids(10), 3);
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn batches_partition_input_exactly() {
        for n in 1..=25 {
            for workers in 1..=8 {
                let input = ids(n);
                let batches = split_into_batches(&input, workers);

                assert!(batches.len() <= workers.min(n));
                assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), n);

                let flattened: Vec<String> = batches.into_iter().flatten().collect();
                assert_eq!(flattened, input, "order must be stable for n={} w={}", n, workers);
            }
        }
    }

    #[test]
    fn more_workers_than_jobs_gives_one_job_per_batch() {
        let batches = split_into_batches(&ids(3), 10);
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 1));
    }

    #[test]
    fn empty_input_gives_no_batches() {
        assert!(split_into_batches(&[], 5).is_empty());
    }

    #[test]
    fn zero_workers_treated_as_one() {
        let batches = split_into_batches(&ids(4), 0);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 4);
    }
}
