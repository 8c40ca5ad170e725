//! Run one operation over several parameter sets.

use std::fmt;
use std::future::Future;

fn announce<P: fmt::Debug>(name: &str, index: usize, param: &P) {
    tracing::info!(
        operation = name,
        parameter_set = index + 1,
        "Running {} with parameter set {}: {:?}",
        name,
        index + 1,
        param
    );
}

/// Run `operation` once per parameter set, in order.
///
/// Stops at the first failure and returns it unchanged.
pub async fn parameterize<P, T, E, F, Fut>(
    name: &str,
    params: impl IntoIterator<Item = P>,
    mut operation: F,
) -> Result<Vec<T>, E>
where
    P: fmt::Debug,
    F: FnMut(P) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut results = Vec::new();
    for (index, param) in params.into_iter().enumerate() {
        announce(name, index, &param);
        results.push(operation(param).await?);
    }
    Ok(results)
}

/// Blocking counterpart of [`parameterize`].
pub fn parameterize_blocking<P, T, E, F>(
    name: &str,
    params: impl IntoIterator<Item = P>,
    mut operation: F,
) -> Result<Vec<T>, E>
where
    P: fmt::Debug,
    F: FnMut(P) -> Result<T, E>,
{
    let mut results = Vec::new();
    for (index, param) in params.into_iter().enumerate() {
        announce(name, index, &param);
        results.push(operation(param)?);
    }
    Ok(results)
}
