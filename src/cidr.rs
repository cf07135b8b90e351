//! CIDR arithmetic for the network bootstrap path.
//!
//! When no subnets are selected, provisioning creates one `/24` subnet per
//! availability zone inside the namespace VPC. The carving is
//! deterministic: subnet `i` occupies the `i`-th `/24` block of the VPC
//! CIDR, so repeated bootstraps of the same VPC produce the same layout.

use std::net::Ipv4Addr;

use crate::error::{Result, StratusError};

/// Returns the `index`-th `/24` block carved from `vpc_cidr`.
///
/// # Errors
///
/// Fails if the CIDR is malformed, its prefix is longer than `/24`, or
/// `index` exceeds the number of `/24` blocks the prefix can hold.
pub fn subnet_cidr(vpc_cidr: &str, index: usize) -> Result<String> {
    let (addr_part, prefix_part) = vpc_cidr
        .split_once('/')
        .ok_or_else(|| malformed(vpc_cidr))?;
    let addr: Ipv4Addr = addr_part.trim().parse().map_err(|_| malformed(vpc_cidr))?;
    let prefix: u8 = prefix_part.trim().parse().map_err(|_| malformed(vpc_cidr))?;

    if prefix > 24 {
        return Err(StratusError::internal(format!(
            "cannot carve /24 subnets from '{vpc_cidr}'"
        )));
    }

    let capacity = 1u32 << (24 - prefix);
    let index = u32::try_from(index).unwrap_or(u32::MAX);
    if index >= capacity {
        return Err(StratusError::internal(format!(
            "subnet index {index} out of range for '{vpc_cidr}' ({capacity} /24 blocks)"
        )));
    }

    let mask = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    };
    let base = u32::from(addr) & mask;
    let block = base | (index << 8);

    Ok(format!("{}/24", Ipv4Addr::from(block)))
}

fn malformed(cidr: &str) -> StratusError {
    StratusError::internal(format!("invalid CIDR block '{cidr}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carves_sequential_blocks_from_a_sixteen() {
        assert_eq!(subnet_cidr("10.0.0.0/16", 0).expect("cidr"), "10.0.0.0/24");
        assert_eq!(subnet_cidr("10.0.0.0/16", 1).expect("cidr"), "10.0.1.0/24");
        assert_eq!(subnet_cidr("10.0.0.0/16", 2).expect("cidr"), "10.0.2.0/24");
        assert_eq!(
            subnet_cidr("172.31.0.0/16", 255).expect("cidr"),
            "172.31.255.0/24"
        );
    }

    #[test]
    fn masks_host_bits_in_the_base_address() {
        assert_eq!(
            subnet_cidr("10.0.42.7/16", 3).expect("cidr"),
            "10.0.3.0/24"
        );
    }

    #[test]
    fn respects_narrower_prefixes() {
        assert_eq!(
            subnet_cidr("10.0.16.0/20", 1).expect("cidr"),
            "10.0.17.0/24"
        );
        assert!(subnet_cidr("10.0.16.0/20", 16).is_err());
    }

    #[test]
    fn rejects_out_of_range_indexes() {
        assert!(subnet_cidr("10.0.0.0/16", 256).is_err());
    }

    #[test]
    fn rejects_malformed_cidrs() {
        assert!(subnet_cidr("10.0.0.0", 0).is_err());
        assert!(subnet_cidr("10.0.0/16", 0).is_err());
        assert!(subnet_cidr("10.0.0.0/33", 0).is_err());
        assert!(subnet_cidr("10.0.0.0/25", 0).is_err());
    }
}
