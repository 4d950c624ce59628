/// Decide whether epoch `epoch` (0-based) of `total_epochs` gets evaluated.
///
/// The first and the last epoch are always evaluated, so even a single-epoch run
/// has a score and every run ends with one. In between, every `frequency`-th epoch
/// is evaluated. A `frequency` of 0 is treated as 1.
pub fn should_evaluate(epoch: usize, total_epochs: usize, frequency: usize) -> bool {
    if epoch == 0 || epoch + 1 == total_epochs {
        return true;
    }
    (epoch + 1) % frequency.max(1) == 0
}

/// Epoch indices that will be evaluated over a whole run.
pub fn evaluation_epochs(total_epochs: usize, frequency: usize) -> Vec<usize> {
    (0..total_epochs).filter(|&e| should_evaluate(e, total_epochs, frequency)).collect()
}
