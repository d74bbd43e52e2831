use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use eposrust_core::raster::{Halftone, Raster};
use eposrust_core::merge_devices;
use eposrust_types::DeviceDescriptor;
use image::{DynamicImage, GrayImage, Luma};

fn discovery_results(printers: usize) -> Vec<DeviceDescriptor> {
    (0..printers)
        .flat_map(|i| {
            let mac = format!("00:26:AB:00:00:{:02X}", i % 256);
            [
                DeviceDescriptor::new(format!("TCP:10.0.{}.{}", i / 256, i % 256)).with_mac(mac.clone()),
                DeviceDescriptor::new(format!("TCPS:10.0.{}.{}", i / 256, i % 256)).with_mac(mac),
                DeviceDescriptor::new(format!("USB:{i:03}")),
            ]
        })
        .collect()
}

fn bench_merge(c: &mut Criterion) {
    let devices = discovery_results(64);
    c.bench_function("merge_devices_192", |b| {
        b.iter(|| merge_devices(black_box(devices.clone())))
    });
}

fn bench_raster(c: &mut Criterion) {
    let gradient = GrayImage::from_fn(640, 480, |x, _| Luma([(x % 256) as u8]));
    let image = DynamicImage::ImageLuma8(gradient);

    c.bench_function("raster_576x200_dither", |b| {
        b.iter(|| Raster::from_image(black_box(&image), 576, 200, Halftone::Dither))
    });
    c.bench_function("raster_576x200_error_diffusion", |b| {
        b.iter(|| Raster::from_image(black_box(&image), 576, 200, Halftone::ErrorDiffusion))
    });
}

criterion_group!(benches, bench_merge, bench_raster);
criterion_main!(benches);
