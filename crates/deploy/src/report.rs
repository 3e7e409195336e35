//! Tables printed by the inspection commands.

use comfy_table::{Table, presets::UTF8_FULL_CONDENSED};

use crate::{
    config::ProjectConfig,
    deployments::DeploymentRecord,
    network::{is_development, network_entry},
};

/// One row per configured network.
pub fn networks_table(config: &ProjectConfig) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(vec![
        "Network",
        "Chain ID",
        "URL",
        "Accounts",
        "Price feed",
    ]);

    for (name, network) in &config.networks {
        let feed = if is_development(name) {
            "mock".to_string()
        } else {
            network
                .chain_id
                .and_then(|chain_id| network_entry(chain_id).ok())
                .map(|entry| entry.feed_address.to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        let accounts = if network.accounts.is_empty() {
            "node".to_string()
        } else {
            format!("{} keys", network.accounts.len())
        };

        let mut name = name.clone();
        if name == config.default_network {
            name.push_str(" (default)");
        }

        table.add_row(vec![
            name,
            network
                .chain_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            network.url.clone().unwrap_or_else(|| "-".to_string()),
            accounts,
            feed,
        ]);
    }

    table
}

/// One row per recorded deployment.
pub fn deployments_table(records: &[DeploymentRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(vec![
        "Contract",
        "Address",
        "Arguments",
        "Block",
        "Deployed at",
    ]);

    for record in records {
        let args = record
            .args
            .iter()
            .map(|arg| match arg {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let deployed_at = chrono::DateTime::from_timestamp(record.deployed_at, 0)
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| record.deployed_at.to_string());

        table.add_row(vec![
            record.contract_name.clone(),
            record.address.to_string(),
            args,
            record
                .block_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            deployed_at,
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::{Address, Bytes};

    #[test]
    fn test_networks_table() {
        let rendered = networks_table(&ProjectConfig::default()).to_string();

        assert!(rendered.contains("hardhat (default)"));
        assert!(rendered.contains("http://127.0.0.1:8545"));
        assert!(rendered.contains("11155111"));
        assert!(rendered.contains("0x694AA1769357215DE4FAC081bf1f309aDC325306"));
        assert!(rendered.contains("mock"));
    }

    #[test]
    fn test_deployments_table() {
        let record = DeploymentRecord {
            contract_name: "FundMe".to_string(),
            address: Address::repeat_byte(0x11),
            args: vec![
                serde_json::json!("180"),
                serde_json::json!("0x694AA1769357215DE4FAC081bf1f309aDC325306"),
            ],
            constructor_arguments: Bytes::new(),
            deployer: Address::ZERO,
            transaction_hash: None,
            block_number: Some(7),
            gas_used: None,
            deployment_hash: String::new(),
            deployed_at: 0,
            abi: serde_json::json!([]),
        };

        let rendered = deployments_table(&[record]).to_string();
        assert!(rendered.contains("FundMe"));
        assert!(rendered.contains("180, 0x694AA1769357215DE4FAC081bf1f309aDC325306"));
        assert!(rendered.contains("1970-01-01 00:00:00 UTC"));
    }
}
