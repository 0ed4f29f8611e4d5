use thiserror::Error;

/// Typed confirmation did not match; the delete must not be sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} name does not match '{expected}'")]
pub struct ConfirmationError {
  pub kind: &'static str,
  pub expected: String,
}

/// Gate a destructive action on the user retyping `expected` exactly.
///
/// No trimming or case folding: "Herbicide " does not confirm "Herbicide".
pub fn confirm_deletion(
  kind: &'static str,
  expected: &str,
  typed: &str,
) -> Result<(), ConfirmationError> {
  if typed == expected {
    Ok(())
  } else {
    Err(ConfirmationError {
      kind,
      expected: expected.to_string(),
    })
  }
}
