use bench::{dispatch_gemm, gemm_backend_from_str, layout_from_str, stored_sizes, BenchScalar, GemmBackend};
use stra_base::StraPar;
use stra_dev::{check_gemm_f32, check_gemm_f64, layout_to_strides, random_matrix_uniform, ABLayout, Bound};

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Times blocked GEMM and one-level Strassen on random matrices
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// number of repeats
    #[arg(short = 'r', long, default_value_t = 2)]
    n_repeats: usize,

    /// dim m
    #[arg(short, long, default_value_t = 200)]
    m: usize,

    /// dim n
    #[arg(short, long, default_value_t = 200)]
    n: usize,

    /// dim k
    #[arg(short, long, default_value_t = 200)]
    k: usize,

    // tranpose layout
    #[arg(short, long, default_value_t = String::from("nn"))]
    t_layout: String,

    #[arg(short, long, default_value_t = false)]
    check: bool,

    // blocked or strassen
    #[arg(short, long, default_value_t = String::from("strassen"))]
    backend: String,

    // f32 or f64
    #[arg(short, long, default_value_t = String::from("f64"))]
    dtype: String,

    /// column panel threads, STRA_JC_NT when unset
    #[arg(long)]
    jc: Option<usize>,

    /// row panel threads, STRA_IC_NT when unset
    #[arg(long)]
    ic: Option<usize>,

    /// micro panel threads, STRA_JR_NT when unset
    #[arg(long)]
    jr: Option<usize>,
}

trait Checked: BenchScalar {
    const ALPHA: Self;
    const BETA: Self;

    #[allow(clippy::too_many_arguments)]
    unsafe fn check(
        m: usize,
        n: usize,
        k: usize,
        layout: &ABLayout,
        a: &[Self],
        b: &[Self],
        c: &[Self],
        c_ref: &mut [Self],
    ) -> f64;
}

macro_rules! impl_checked {
    ($t:ty, $check:ident) => {
        impl Checked for $t {
            const ALPHA: Self = 1.0;
            const BETA: Self = 1.0;

            unsafe fn check(
                m: usize,
                n: usize,
                k: usize,
                layout: &ABLayout,
                a: &[Self],
                b: &[Self],
                c: &[Self],
                c_ref: &mut [Self],
            ) -> f64 {
                let (a_rs, a_cs, b_rs, b_cs, c_rs, c_cs) = layout_to_strides(layout, m, n, k);
                $check(
                    m,
                    n,
                    k,
                    Self::ALPHA,
                    a.as_ptr(),
                    a_rs,
                    a_cs,
                    b.as_ptr(),
                    b_rs,
                    b_cs,
                    Self::BETA,
                    c,
                    c_rs,
                    c_cs,
                    c_ref,
                )
            }
        }
    };
}

impl_checked!(f64, check_gemm_f64);
impl_checked!(f32, check_gemm_f32);

fn test_gemm<T>(m: usize, n: usize, k: usize, backend: GemmBackend, layout: &ABLayout, par: &StraPar, check: bool) -> f64
where
    T: Checked + Default + Bound,
{
    let (a_len, b_len) = stored_sizes(layout, m, n, k);
    let mut a = vec![T::default(); a_len];
    let mut b = vec![T::default(); b_len];
    let mut c = vec![T::default(); m.max(1) * n];
    random_matrix_uniform(&mut a);
    random_matrix_uniform(&mut b);
    random_matrix_uniform(&mut c);
    let mut c_ref = c.clone();

    let start_time = std::time::Instant::now();
    if let Err(e) = dispatch_gemm(backend, layout, m, n, k, T::ALPHA, &a, &b, T::BETA, &mut c, par) {
        tracing::error!(error = %e, "multiply failed");
        std::process::exit(1);
    }
    let end_time = start_time.elapsed().as_nanos() as f64 / 1e9;

    if check {
        let diff = unsafe { T::check(m, n, k, layout, &a, &b, &c, &mut c_ref) };
        println!("diff: {}", diff);
    }
    end_time
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let (m, n, k) = (args.m, args.n, args.k);
    let Some(layout) = layout_from_str(&args.t_layout) else {
        eprintln!("unsupported layout: {}", args.t_layout);
        std::process::exit(2);
    };
    let Some(backend) = gemm_backend_from_str(&args.backend) else {
        eprintln!("unsupported backend: {}", args.backend);
        std::process::exit(2);
    };
    let env_par = StraPar::from_env();
    let par = match StraPar::new(
        args.jc.unwrap_or(env_par.jc_nt),
        args.ic.unwrap_or(env_par.ic_nt),
        args.jr.unwrap_or(env_par.jr_nt),
    ) {
        Ok(par) => par,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    tracing::info!(?par, ?backend, ?layout, m, n, k, "starting benchmark");

    let mut total_time = 0.0;
    let mut best_time = f64::INFINITY;
    for _ in 0..args.n_repeats {
        let end_time = match args.dtype.as_str() {
            "f32" => test_gemm::<f32>(m, n, k, backend, &layout, &par, args.check),
            _ => test_gemm::<f64>(m, n, k, backend, &layout, &par, args.check),
        };
        total_time += end_time;
        println!("time: {}, total_time: {}", end_time, total_time);
        if best_time > end_time {
            best_time = end_time;
        }
    }
    let gflops = 2.0 * m as f64 * n as f64 * k as f64 / best_time / 1e9;
    println!("best_time: {}, GFLOPS: {}", best_time, gflops);
}
