//! Graph smoke check: build a 3-node graph, print it, and move it to the
//! GPU when one is present.

use anyhow::ensure;
use tracing::info;
use tracing_subscriber::EnvFilter;

use txt2kg::kg::{cuda_available, Device, GraphData};

fn sample_graph() -> GraphData {
    let x = vec![vec![-1.0], vec![0.0], vec![1.0]];
    let edge_index = [vec![0, 1, 1, 2], vec![1, 0, 2, 1]];
    GraphData::new(x, edge_index)
}

fn log_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("txt2kg=info".parse()?)
        .add_directive("graph_smoke=info".parse()?))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter()?).init();

    let data = sample_graph();
    ensure!(data.validate(), "edge index refers to missing nodes");
    println!("{}", data);

    if cuda_available() {
        println!("CUDA is available!");
        let data = data.to(Device::Cuda);
        info!(device = %data.device, "Graph moved");
    } else {
        println!("CUDA is not available!");
    }

    Ok(())
}
