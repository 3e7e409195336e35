use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{I256, U256},
};
use anyhow::Result;

use super::{DeployContext, DeployScript, Tag};
use crate::{
    deployments::{DeployOptions, Deployments},
    network::{CONFIRMATIONS, DECIMALS, INITIAL_ANSWER},
    verify::Verifier,
};

pub const MOCK_V3_AGGREGATOR: &str = "MockV3Aggregator";

/// Constructor arguments of the mock feed: `(uint8 decimals, int256 initialAnswer)`.
pub fn mock_feed_args() -> Result<Vec<DynSolValue>> {
    let initial_answer = I256::try_from(INITIAL_ANSWER)
        .map_err(|e| anyhow::anyhow!("Initial answer does not fit in int256: {:?}", e))?;

    Ok(vec![
        DynSolValue::Uint(U256::from(DECIMALS), 8),
        DynSolValue::Int(initial_answer, 256),
    ])
}

/// Deploys `MockV3Aggregator` on development networks.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockFeedScript;

impl DeployScript for MockFeedScript {
    const NAME: &'static str = "00-deploy-mock";
    const TAGS: &'static [Tag] = &[Tag::All, Tag::Mocks];

    async fn run<D: Deployments, V: Verifier>(
        &self,
        ctx: &mut DeployContext<'_, D, V>,
    ) -> Result<()> {
        if !ctx.network.is_development() {
            tracing::info!("environment is not local, MockV3Aggregator deployment skipped");
            return Ok(());
        }

        ctx.deployments
            .deploy(
                MOCK_V3_AGGREGATOR,
                DeployOptions {
                    from: ctx.first_account,
                    args: mock_feed_args()?,
                    log: true,
                    wait_confirmations: CONFIRMATIONS,
                },
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_feed_args() {
        let args = mock_feed_args().unwrap();

        assert_eq!(args.len(), 2);
        assert_eq!(args[0], DynSolValue::Uint(U256::from(8), 8));
        assert_eq!(
            args[1],
            DynSolValue::Int(I256::try_from(300_000_000_000i64).unwrap(), 256)
        );
    }
}
