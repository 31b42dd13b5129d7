//! Livenet deploy and demo binary for the Staked Vault Strategy.
//!
//! Run with:
//! - Deploy only:           STRATEGY_LIVENET_MODE=deploy cargo run --bin strategy_livenet --features=livenet
//! - Deploy + demo:         STRATEGY_LIVENET_MODE=deploy_and_demo cargo run --bin strategy_livenet --features=livenet
//! - Query existing:        STRATEGY_LIVENET_MODE=query STRATEGY_EXISTING=... cargo run ...
//!
//! Required environment variables (Odra livenet):
//! - ODRA_CASPER_LIVENET_SECRET_KEY_PATH
//! - ODRA_CASPER_LIVENET_NODE_ADDRESS        (base URL; Odra appends "/rpc")
//! - ODRA_CASPER_LIVENET_EVENTS_URL          (required by Odra; placeholder URL is OK here)
//! - ODRA_CASPER_LIVENET_CHAIN_NAME
//!
//! Optional:
//! - STRATEGY_ASSET                          (existing asset token; default: deploy a test token)
//! - STRATEGY_VAULT                          (existing CEP-4626 vault; default: deploy a mock vault)
//! - STRATEGY_STAKING                        (existing staking facility, or "none" for unstaked mode;
//!                                            default: deploy a mock facility)
//! - STRATEGY_GOVERNANCE                     (default: caller)
//! - STRATEGY_SWAP_TARGET                    ("vault_share" or "asset"; default: vault_share)
//! - STRATEGY_EXISTING                       (64-hex or formatted "hash-..."/"contract-package-...")
//! - STRATEGY_DEMO_AMOUNT                    (whole tokens; default: 100)
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_TOKEN    (motes)
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_STRATEGY (motes)
//! - ODRA_CASPER_LIVENET_CALL_GAS            (motes)
//! - ODRA_CASPER_LIVENET_GAS                 (legacy fallback; motes)

use odra::casper_types::U256;
use odra::host::{Deployer, HostRef, HostRefLoader};
use odra::prelude::*;

use staked_vault_casper::mocks::{
    MockStakingRewards, MockStakingRewardsInitArgs, MockVault, MockVaultInitArgs,
};
use staked_vault_casper::strategy::{
    StakedVaultStrategy, StakedVaultStrategyHostRef, StakedVaultStrategyInitArgs, SwapTarget,
};
use staked_vault_casper::tokens::{TestToken, TestTokenHostRef, TestTokenInitArgs};

const MOTES_PER_CSPR: u64 = 1_000_000_000;
const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000; // 1e18

const DEFAULT_DEPLOY_GAS_TOKEN_MOTES: u64 = 450_000_000_000; // 450 CSPR
const DEFAULT_DEPLOY_GAS_STRATEGY_MOTES: u64 = 600_000_000_000; // 600 CSPR
const DEFAULT_CALL_GAS_MOTES: u64 = 50_000_000_000; // 50 CSPR

fn main() {
    println!("============================================");
    println!("  Staked Vault Strategy - Livenet");
    println!("============================================\n");

    let env = odra_casper_livenet_env::env();

    let mode = std::env::var("STRATEGY_LIVENET_MODE").unwrap_or_else(|_| "deploy".to_string());
    let should_deploy = mode == "deploy" || mode == "deploy_and_demo";
    let should_demo = mode == "deploy_and_demo";
    let should_query = mode == "query";

    let gas_fallback = read_u64_env("ODRA_CASPER_LIVENET_GAS", DEFAULT_DEPLOY_GAS_TOKEN_MOTES);
    let deploy_gas_token = read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS_TOKEN", gas_fallback);
    let deploy_gas_strategy = read_u64_env(
        "ODRA_CASPER_LIVENET_DEPLOY_GAS_STRATEGY",
        DEFAULT_DEPLOY_GAS_STRATEGY_MOTES,
    );
    let call_gas = read_u64_env("ODRA_CASPER_LIVENET_CALL_GAS", DEFAULT_CALL_GAS_MOTES);

    let governance = std::env::var("STRATEGY_GOVERNANCE")
        .map(|raw| parse_contract_address(&raw))
        .unwrap_or_else(|_| env.caller());
    let swap_target = match std::env::var("STRATEGY_SWAP_TARGET").as_deref() {
        Ok("asset") => SwapTarget::Asset,
        _ => SwapTarget::VaultShare,
    };
    let demo_amount = U256::from(read_u64_env("STRATEGY_DEMO_AMOUNT", 100)) * U256::from(TOKEN_UNIT);

    println!("[INFO] Mode: {}", mode);
    println!("[INFO] Caller: {:?}", env.caller());
    println!("[INFO] Governance: {:?}", governance);
    println!(
        "[INFO] Gas (motes): deploy_token={} ({} CSPR), deploy_strategy={} ({} CSPR), calls={} ({} CSPR)",
        deploy_gas_token,
        deploy_gas_token / MOTES_PER_CSPR,
        deploy_gas_strategy,
        deploy_gas_strategy / MOTES_PER_CSPR,
        call_gas,
        call_gas / MOTES_PER_CSPR
    );
    println!();

    if !should_deploy && !should_query {
        panic!("Unknown STRATEGY_LIVENET_MODE: {}", mode);
    }

    // ==========================================
    // Query mode: Output strategy position as JSON
    // ==========================================
    if should_query {
        let raw = std::env::var("STRATEGY_EXISTING")
            .unwrap_or_else(|_| panic!("STRATEGY_EXISTING must be set for mode={}", mode));
        let strategy = StakedVaultStrategy::load(&env, parse_contract_address(&raw));
        println!(
            "STRATEGY_POSITION_JSON={{\"idle_assets\":\"{}\",\"loose_shares\":\"{}\",\"staked_balance\":\"{}\",\"max_withdrawable\":\"{}\",\"available_deposit_capacity\":\"{}\",\"estimated_total_assets\":\"{}\",\"reward_tokens\":{},\"is_shutdown\":{}}}",
            strategy.idle_assets(),
            strategy.loose_shares(),
            strategy.staked_balance(),
            strategy.max_withdrawable(),
            strategy.available_deposit_capacity(),
            strategy.estimated_total_assets(),
            strategy.reward_tokens().len(),
            strategy.is_shutdown()
        );
        return;
    }

    // ==========================================
    // Step 1: Deploy (or reuse) the asset
    // ==========================================
    let (asset_addr, demo_asset) = match std::env::var("STRATEGY_ASSET") {
        Ok(raw) => {
            println!("[STEP 1] Reusing existing asset token...");
            let addr = parse_contract_address(&raw);
            println!("[OK] Asset: {:?}", addr);
            println!();
            (addr, None)
        }
        Err(_) => {
            println!("[STEP 1] Deploying test asset token...");
            env.set_gas(deploy_gas_token);
            let asset = TestToken::deploy(
                &env,
                TestTokenInitArgs {
                    symbol: "tAST".to_string(),
                    name: "Test Asset".to_string(),
                },
            );
            println!("[OK] Asset deployed at: {:?}", asset.address());
            println!();
            (asset.address(), Some(asset))
        }
    };

    // ==========================================
    // Step 2: Deploy (or reuse) the vault
    // ==========================================
    let vault_addr = match std::env::var("STRATEGY_VAULT") {
        Ok(raw) => {
            println!("[STEP 2] Reusing existing vault...");
            let addr = parse_contract_address(&raw);
            println!("[OK] Vault: {:?}", addr);
            println!();
            addr
        }
        Err(_) => {
            println!("[STEP 2] Deploying mock vault...");
            env.set_gas(deploy_gas_token);
            let vault = MockVault::deploy(
                &env,
                MockVaultInitArgs {
                    asset: asset_addr,
                    symbol: "yvAST".to_string(),
                    name: "Vault Asset Shares".to_string(),
                },
            );
            println!("[OK] Vault deployed at: {:?}", vault.address());
            println!();
            vault.address()
        }
    };

    // ==========================================
    // Step 3: Deploy (or reuse) the staking facility
    // ==========================================
    let staking_addr = match std::env::var("STRATEGY_STAKING") {
        Ok(raw) if raw.trim() == "none" => {
            println!("[STEP 3] No staking facility, strategy runs unstaked.");
            println!();
            None
        }
        Ok(raw) => {
            println!("[STEP 3] Reusing existing staking facility...");
            let addr = parse_contract_address(&raw);
            println!("[OK] Staking: {:?}", addr);
            println!();
            Some(addr)
        }
        Err(_) => {
            println!("[STEP 3] Deploying reward token and mock staking facility...");
            env.set_gas(deploy_gas_token);
            let reward = TestToken::deploy(
                &env,
                TestTokenInitArgs {
                    symbol: "tRWD".to_string(),
                    name: "Test Reward".to_string(),
                },
            );
            env.set_gas(deploy_gas_token);
            let staking = MockStakingRewards::deploy(
                &env,
                MockStakingRewardsInitArgs {
                    staking_token: vault_addr,
                    reward_token: reward.address(),
                },
            );
            println!("[OK] Reward token deployed at: {:?}", reward.address());
            println!("[OK] Staking deployed at: {:?}", staking.address());
            println!();
            Some(staking.address())
        }
    };

    // ==========================================
    // Step 4: Deploy (or reuse) the strategy
    // ==========================================
    let strategy = match std::env::var("STRATEGY_EXISTING") {
        Ok(raw) => {
            println!("[STEP 4] Reusing existing strategy...");
            let addr = parse_contract_address(&raw);
            println!("[OK] Strategy: {:?}", addr);
            println!();
            StakedVaultStrategy::load(&env, addr)
        }
        Err(_) => {
            println!("[STEP 4] Deploying Staked Vault Strategy...");
            env.set_gas(deploy_gas_strategy);
            let strategy = StakedVaultStrategy::deploy(
                &env,
                StakedVaultStrategyInitArgs {
                    asset: asset_addr,
                    vault: vault_addr,
                    staking: staking_addr,
                    governance,
                    swap_target,
                },
            );
            println!("[OK] Strategy deployed at: {:?}", strategy.address());
            println!("     Asset: {:?}", strategy.asset());
            println!("     Vault: {:?}", strategy.vault());
            println!("     Staking: {:?}", strategy.staking());
            println!("     Management: {:?}", strategy.management());
            println!();
            strategy
        }
    };
    let strategy_addr = strategy.address();

    // ==========================================
    // Demo: fund -> deploy -> report -> unstake
    // ==========================================
    if should_demo {
        let mut strategy = strategy;
        match demo_asset {
            Some(mut asset) => run_demo(&env, &mut strategy, &mut asset, demo_amount, call_gas),
            None => println!("[SKIP] Demo needs a freshly deployed test asset."),
        }
    }

    output_deploy_json(asset_addr, vault_addr, staking_addr, strategy_addr);
}

fn run_demo(
    env: &odra::host::HostEnv,
    strategy: &mut StakedVaultStrategyHostRef,
    asset: &mut TestTokenHostRef,
    amount: U256,
    call_gas: u64,
) {
    println!("[DEMO 1] Minting {} asset to the strategy...", amount);
    env.set_gas(call_gas);
    asset.faucet_mint(strategy.address(), amount);
    println!("[OK] Mint complete.");
    print_position_info(strategy);

    println!("[DEMO 2] Deploying funds...");
    env.set_gas(call_gas);
    strategy.deploy_funds(amount);
    println!("[OK] Funds deployed.");
    print_position_info(strategy);

    println!("[DEMO 3] Reporting...");
    env.set_gas(call_gas);
    let total_assets = strategy.report();
    println!("[OK] Reported total assets: {}", total_assets);

    let staked = strategy.staked_balance();
    if staked.is_zero() {
        println!("[SKIP] Nothing staked, skipping unstake.");
        return;
    }
    let half = staked / 2;
    println!("[DEMO 4] Unstaking {} shares...", half);
    env.set_gas(call_gas);
    strategy.unstake(half);
    println!("[OK] Unstake complete.");
    print_position_info(strategy);
}

fn print_position_info(strategy: &StakedVaultStrategyHostRef) {
    println!("     idle_assets: {}", strategy.idle_assets());
    println!("     loose_shares: {}", strategy.loose_shares());
    println!("     staked_balance: {}", strategy.staked_balance());
    println!("     max_withdrawable: {}", strategy.max_withdrawable());
    println!("     available_withdraw_limit: {}", strategy.available_withdraw_limit());
    println!("     available_deposit_capacity: {}", strategy.available_deposit_capacity());
    println!("     estimated_total_assets: {}", strategy.estimated_total_assets());
    println!();
}

fn read_u64_env(name: &str, default_value: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => {
            let cleaned = raw.trim().replace('_', "");
            cleaned.parse::<u64>().unwrap_or(default_value)
        }
        Err(_) => default_value,
    }
}

fn output_deploy_json(
    asset_addr: Address,
    vault_addr: Address,
    staking_addr: Option<Address>,
    strategy_addr: Address,
) {
    let chain_name =
        std::env::var("ODRA_CASPER_LIVENET_CHAIN_NAME").unwrap_or_else(|_| "casper-test".to_string());
    let node_url = std::env::var("ODRA_CASPER_LIVENET_NODE_ADDRESS")
        .unwrap_or_else(|_| "https://node.testnet.casper.network".to_string());
    let staking_hash = staking_addr
        .map(|addr| format_address_hash(&addr))
        .unwrap_or_default();

    println!(
        r#"STRATEGY_DEPLOY_JSON={{"chain_name":"{}","node_url":"{}","asset_hash":"{}","vault_hash":"{}","staking_hash":"{}","strategy_hash":"{}","deployed_at":"{}"}}"#,
        chain_name,
        node_url,
        format_address_hash(&asset_addr),
        format_address_hash(&vault_addr),
        staking_hash,
        format_address_hash(&strategy_addr),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
}

fn format_address_hash(addr: &Address) -> String {
    let debug_str = format!("{:?}", addr);
    let (Some(start), Some(end)) = (debug_str.find('['), debug_str.rfind(']')) else {
        return debug_str;
    };
    debug_str[start + 1..end]
        .split(", ")
        .filter_map(|part| part.strip_prefix("0x").or_else(|| part.strip_prefix("0X")))
        .collect()
}

fn parse_contract_address(raw: &str) -> Address {
    use odra::casper_types::account::AccountHash;
    use odra::casper_types::contracts::ContractPackageHash;

    fn decode_hex_32(s: &str) -> [u8; 32] {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            panic!("Invalid address hash (expected 64 hex): {}", s);
        }
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .unwrap_or_else(|_| panic!("Invalid hex in address: {}", s));
        }
        out
    }

    let trimmed = raw.trim();
    if let Some(hex) = trimmed.strip_prefix("account-hash-") {
        return Address::Account(AccountHash::new(decode_hex_32(hex)));
    }
    let contract_hex = ["contract-package-", "package-", "hash-"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    Address::Contract(ContractPackageHash::new(decode_hex_32(contract_hex)))
}
