use super::SolverResponse;

/// Reads a `rows x cols` grid of raw solver values keyed `"<row>_<col>"`.
///
/// Missing or non-numeric entries read as 0. Unlike [`super::decode`],
/// values are passed through as-is rather than filtered on `== 1`.
pub fn decode_matrix(response: &SolverResponse, rows: usize, cols: usize) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| {
                    response
                        .get(&format!("{}_{}", r, c))
                        .and_then(|v| v.as_f64())
                        .unwrap_or(0.0)
                })
                .collect()
        })
        .collect()
}
