/// Ordered group → members mapping with insert-if-absent construction.
pub mod group_membership;
/// Reads the Active Directory membership CSV export.
pub mod loader;
