//! Identity smoke fixture.
//!
//! Optionally loads a custom-operator extension library, builds a session
//! over a model file (default `testdata/identity.json`), runs it once on a
//! random f32 input and asserts the first output equals the input. Exits
//! non-zero on any setup failure or on a mismatch.
//!
//! Usage: `identity_smoke [--extension <path>] [--model <path>]`

use log::{error, info};
use rand::Rng;

use tensorgraph_inference::errors::{ExtensionError, RunError, SessionError, TensorError};
use tensorgraph_inference::{load_extension, DType, Session, SessionOptions, Tensor};

#[derive(Debug, thiserror::Error)]
enum SmokeError {
    #[error(transparent)]
    Extension(#[from] ExtensionError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Tensor(#[from] TensorError),

    #[error("identity check failed for input '{input}':\n  expected: {expected:?}\n  actual:   {actual:?}")]
    Mismatch {
        input: String,
        expected: Vec<f32>,
        actual: Vec<f32>,
    },

    #[error("{0}")]
    Usage(String),
}

struct Args {
    extension: Option<String>,
    model: String,
}

fn parse_args() -> Result<Args, SmokeError> {
    let mut extension = None;
    let mut model = "testdata/identity.json".to_string();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--extension" => {
                extension = Some(args.next().ok_or_else(|| {
                    SmokeError::Usage("--extension requires a library path".to_string())
                })?);
            }
            "--model" => {
                model = args.next().ok_or_else(|| {
                    SmokeError::Usage("--model requires a file path".to_string())
                })?;
            }
            other => {
                return Err(SmokeError::Usage(format!(
                    "unrecognized argument '{other}' (expected --extension or --model)"
                )));
            }
        }
    }
    Ok(Args { extension, model })
}

fn run_smoke() -> Result<(), SmokeError> {
    let args = parse_args()?;

    if let Some(path) = &args.extension {
        let extension = load_extension(path)?;
        info!(
            "extension {} registered {} operator(s)",
            extension.path().display(),
            extension.operators().len()
        );
    }

    let session = Session::from_file(&args.model, &SessionOptions::default())?;
    let spec = session
        .input_specs()
        .first()
        .cloned()
        .ok_or_else(|| SmokeError::Usage("model declares no inputs".to_string()))?;
    if spec.dtype != DType::F32 {
        return Err(SmokeError::Usage(format!(
            "model input '{}' must be F32, found {}",
            spec.name, spec.dtype
        )));
    }

    let mut rng = rand::thread_rng();
    let element_count: usize = spec.shape.iter().product();
    let values: Vec<f32> = (0..element_count).map(|_| rng.gen()).collect();
    let input = Tensor::from_f32(spec.shape.clone(), values)?;

    let outputs = session.run(&[(spec.name.as_str(), input.clone())])?;
    let output = &outputs[0];
    if *output != input {
        return Err(SmokeError::Mismatch {
            input: spec.name,
            expected: input.as_f32().unwrap_or(&[]).to_vec(),
            actual: output.as_f32().unwrap_or(&[]).to_vec(),
        });
    }

    info!(
        "identity check passed: '{}' with shape {:?} came back unchanged",
        spec.name, spec.shape
    );
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run_smoke() {
        error!("{err}");
        std::process::exit(1);
    }
}
