use super::metrics::CompressionMetrics;

/// Console block printed after each compressed image.
pub fn format_metrics(metrics: &CompressionMetrics) -> String {
    format!(
        "Mean Square Error (MSE): {:.2}\nPeak Signal-to-Noise Ratio (PSNR): {:.2} dB\nCompression Ratio: {:.2}:1",
        metrics.mse, metrics.psnr, metrics.compression_ratio
    )
}

pub fn print_section(title: &str) {
    println!("\n{}", title);
    println!("{}", "-".repeat(title.len()));
}

pub fn print_image_metrics(category: &str, index: usize, metrics: &CompressionMetrics) {
    println!("\nMetrics for {} image {}:", category, index + 1);
    println!("{}", format_metrics(metrics));
}
