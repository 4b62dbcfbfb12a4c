/// Numeric helpers shared by the evaluator and printers.
///
/// Provides the language's number formatting (integral floats print without a
/// decimal point) and the checked float-to-index conversion used by member
/// access on lists.
pub mod num;
