use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
};
use anyhow::Result;

use super::{DeployContext, DeployScript, MOCK_V3_AGGREGATOR, Tag};
use crate::{
    deployments::{DeployOptions, Deployments},
    network::{FeedSource, LOCK_TIME, resolve_feed},
    verify::{VerificationRequest, Verifier, should_verify},
};

pub const FUND_ME: &str = "FundMe";

/// Constructor arguments of `FundMe`: `(uint256 lockTime, address dataFeed)`.
pub fn fund_me_args(feed: Address) -> Vec<DynSolValue> {
    vec![
        DynSolValue::Uint(U256::from(LOCK_TIME), 256),
        DynSolValue::Address(feed),
    ]
}

/// Deploys `FundMe` against the network's price feed, then verifies it on Sepolia.
#[derive(Debug, Clone, Copy, Default)]
pub struct FundMeScript;

impl DeployScript for FundMeScript {
    const NAME: &'static str = "01-deploy-fund-me";
    const TAGS: &'static [Tag] = &[Tag::All, Tag::Fundmd];
    const DEPENDENCIES: &'static [Tag] = &[Tag::Mocks];

    async fn run<D: Deployments, V: Verifier>(
        &self,
        ctx: &mut DeployContext<'_, D, V>,
    ) -> Result<()> {
        let plan = resolve_feed(&ctx.network.name, ctx.network.chain_id)?;

        let feed = match plan.source {
            FeedSource::Mock => ctx.deployments.get(MOCK_V3_AGGREGATOR)?.address,
            FeedSource::Static(address) => address,
        };
        tracing::debug!(feed = %feed, confirmations = plan.confirmations, "Resolved price feed");

        let fund_me = ctx
            .deployments
            .deploy(
                FUND_ME,
                DeployOptions {
                    from: ctx.first_account,
                    args: fund_me_args(feed),
                    log: true,
                    wait_confirmations: plan.confirmations,
                },
            )
            .await?;

        if should_verify(ctx.network.chain_id, ctx.verifier.api_key()) {
            ctx.verifier
                .verify(&VerificationRequest {
                    contract_name: FUND_ME.to_string(),
                    address: fund_me.address,
                    constructor_arguments: fund_me.constructor_arguments,
                })
                .await?;
        } else {
            tracing::info!("network is not sepolia, verification skipped");
        }

        Ok(())
    }
}
