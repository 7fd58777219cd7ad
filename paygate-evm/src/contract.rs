//! Solidity event definitions read from transaction receipts.

use alloy_sol_types::sol;

sol! {
    /// Standard ERC-20 `Transfer` event.
    ///
    /// Reference: <https://eips.ethereum.org/EIPS/eip-20>
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    event Transfer(address indexed from, address indexed to, uint256 value);
}
