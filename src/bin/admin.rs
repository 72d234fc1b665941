use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use stark_vip::domain::{ArtifactPaths, ProofRequest, RawProofRequest};
use stark_vip::infra::{
    CalldataGenerator, GaragaCalldataGenerator, OnChainVerifier, StarknetVerifier,
};
use stark_vip::prover::{codec, generate_random_nonce, validate};
use stark_vip::relay::VerificationRelay;
use stark_vip::report::Reporter;
use stark_vip::server::Config;

fn print_help() {
    eprintln!(
        "\
stark-vip-admin

USAGE:
  stark-vip-admin <command> [options]

COMMANDS:
  verify                          Verify proof artifacts against the verifier contract
  calldata                        Print the verifier calldata for proof artifacts
  check-connection                Query the configured node and print contract info
  validate                        Check a proof request without running the circuit
  nonce                           Print a fresh random nonce
  encode                          Base64-encode a binary file
  decode                          Decode a base64 file

ENVIRONMENT:
  STARKNET_RPC_URL, STARKNET_CHAIN_ID, CONTRACT_ADDRESS, GARAGA_BIN,
  CALLDATA_PARSE_MODE, ZK_ARTIFACTS_DIR (same meaning as for the server)

verify / calldata OPTIONS:
  --dir <path>                    Directory holding proof, vk and public_inputs
  --proof <path>                  Proof file
  --vk <path>                     Verification key file
  --public-inputs <path>          Public inputs file
  (defaults to the artifacts configured in the environment)

validate OPTIONS:
  --threshold <n>                 (required)
  --balance <n>                   (required)
  --nonce <value>                 (required)
  --secret-nonce <value>          (defaults to --nonce)

encode OPTIONS:
  --input <path>                  (required)

decode OPTIONS:
  --input <path>                  (required) File holding base64 text
  --output <path>                 (optional) Write bytes here instead of printing hex
"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: VecDeque<String> = std::env::args().skip(1).collect();
    let Some(command) = args.pop_front() else {
        print_help();
        return Ok(());
    };

    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_help();
        return Ok(());
    }

    match command.as_str() {
        "verify" | "calldata" => {
            let mut dir: Option<String> = None;
            let mut proof: Option<String> = None;
            let mut vk: Option<String> = None;
            let mut public_inputs: Option<String> = None;

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--dir" => {
                        dir = Some(
                            args.pop_front()
                                .ok_or_else(|| anyhow::anyhow!("missing value for --dir"))?,
                        );
                    }
                    "--proof" => {
                        proof = Some(
                            args.pop_front()
                                .ok_or_else(|| anyhow::anyhow!("missing value for --proof"))?,
                        );
                    }
                    "--vk" => {
                        vk = Some(
                            args.pop_front()
                                .ok_or_else(|| anyhow::anyhow!("missing value for --vk"))?,
                        );
                    }
                    "--public-inputs" => {
                        public_inputs = Some(args.pop_front().ok_or_else(|| {
                            anyhow::anyhow!("missing value for --public-inputs")
                        })?);
                    }
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let config = Config::from_env()?;
            let paths = match (dir, proof, vk, public_inputs) {
                (Some(dir), None, None, None) => ArtifactPaths::in_dir(dir),
                (None, Some(proof), Some(vk), Some(public_inputs)) => {
                    ArtifactPaths::new(proof, vk, public_inputs)
                }
                (None, None, None, None) => config.default_artifacts.clone().ok_or_else(|| {
                    anyhow::anyhow!("no artifacts given and ZK_ARTIFACTS_DIR is not set")
                })?,
                (Some(_), ..) => anyhow::bail!("--dir cannot be combined with file options"),
                _ => anyhow::bail!("--proof, --vk and --public-inputs must be given together"),
            };

            let calldata = Arc::new(GaragaCalldataGenerator::new(
                config.garaga_bin.clone(),
                config.parse_mode,
            ));

            if command == "calldata" {
                let array = calldata.generate_calldata(&paths).await?;
                println!("{}", serde_json::to_string_pretty(&array)?);
                return Ok(());
            }

            let verifier = Arc::new(StarknetVerifier::new(
                config.starknet.rpc_url.clone(),
                config.starknet.contract_address.clone(),
            ));
            let relay = VerificationRelay::new(
                calldata,
                verifier,
                config.starknet.contract_address.clone(),
                config.starknet.network(),
            );
            let reporter = Reporter::new(config.environment.clone());

            match relay.verify(&paths).await {
                Ok(result) => {
                    let report = reporter.report_result(&result);
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "success": report.success,
                            "message": report.message,
                            "result": result,
                        }))?
                    );
                    if !result.is_valid {
                        anyhow::bail!("proof rejected by the verifier contract");
                    }
                    Ok(())
                }
                Err(e) => {
                    let report = reporter.report_error(&e);
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Err(e.into())
                }
            }
        }
        "check-connection" => {
            if let Some(arg) = args.pop_front() {
                if matches!(arg.as_str(), "-h" | "--help") {
                    print_help();
                    return Ok(());
                }
                anyhow::bail!("unexpected argument: {arg}");
            }

            let config = Config::from_env()?;
            let verifier = StarknetVerifier::new(
                config.starknet.rpc_url.clone(),
                config.starknet.contract_address.clone(),
            );
            let chain_id = verifier.chain_id().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "chainId": chain_id,
                    "contract": config.starknet.contract_info(),
                }))?
            );
            Ok(())
        }
        "validate" => {
            let mut threshold: Option<i64> = None;
            let mut balance: Option<i64> = None;
            let mut nonce: Option<String> = None;
            let mut secret_nonce: Option<String> = None;

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--threshold" => {
                        let raw = args
                            .pop_front()
                            .ok_or_else(|| anyhow::anyhow!("missing value for --threshold"))?;
                        threshold = Some(raw.parse()?);
                    }
                    "--balance" => {
                        let raw = args
                            .pop_front()
                            .ok_or_else(|| anyhow::anyhow!("missing value for --balance"))?;
                        balance = Some(raw.parse()?);
                    }
                    "--nonce" => {
                        nonce = Some(
                            args.pop_front()
                                .ok_or_else(|| anyhow::anyhow!("missing value for --nonce"))?,
                        );
                    }
                    "--secret-nonce" => {
                        secret_nonce = Some(args.pop_front().ok_or_else(|| {
                            anyhow::anyhow!("missing value for --secret-nonce")
                        })?);
                    }
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let nonce = nonce.ok_or_else(|| anyhow::anyhow!("--nonce is required"))?;
            let raw = RawProofRequest {
                threshold: threshold
                    .ok_or_else(|| anyhow::anyhow!("--threshold is required"))?,
                balance: balance.ok_or_else(|| anyhow::anyhow!("--balance is required"))?,
                secret_nonce: secret_nonce.unwrap_or_else(|| nonce.clone()),
                nonce,
            };
            let request = ProofRequest::try_from(raw)?;
            validate(&request)?;
            println!("ok: request is valid");
            Ok(())
        }
        "nonce" => {
            println!("{}", generate_random_nonce());
            Ok(())
        }
        "encode" | "decode" => {
            let mut input: Option<PathBuf> = None;
            let mut output: Option<PathBuf> = None;

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--input" => {
                        input = Some(PathBuf::from(
                            args.pop_front()
                                .ok_or_else(|| anyhow::anyhow!("missing value for --input"))?,
                        ));
                    }
                    "--output" if command == "decode" => {
                        output = Some(PathBuf::from(
                            args.pop_front()
                                .ok_or_else(|| anyhow::anyhow!("missing value for --output"))?,
                        ));
                    }
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let input = input.ok_or_else(|| anyhow::anyhow!("--input is required"))?;
            let bytes = tokio::fs::read(&input).await?;

            if command == "encode" {
                println!("{}", codec::encode(&bytes));
                return Ok(());
            }

            let text = String::from_utf8(bytes)
                .map_err(|_| anyhow::anyhow!("{} is not base64 text", input.display()))?;
            let decoded = codec::decode_lenient(&text)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &decoded).await?;
                    println!("ok: wrote {} bytes to {}", decoded.len(), path.display());
                }
                None => println!("0x{}", hex::encode(&decoded)),
            }
            Ok(())
        }
        other => {
            print_help();
            anyhow::bail!("unknown command: {other}");
        }
    }
}
