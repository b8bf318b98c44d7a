// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks for the boolean kernel's public entry point.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{Point3, Vector3};
use polyframe_boolean::geometry::{cube, sphere};
use polyframe_boolean::{run, BooleanOp, ToleranceBundle};

fn bench_cube_cube(c: &mut Criterion) {
    let mut group = c.benchmark_group("cube_cube");

    let a = cube(Vector3::new(10.0, 10.0, 10.0), true);
    let b = cube(Vector3::new(8.0, 8.0, 8.0), true);

    group.bench_function("union", |b_| {
        b_.iter(|| run(black_box(&a), black_box(&b), BooleanOp::Union, ToleranceBundle::reference()).unwrap());
    });

    group.bench_function("intersection", |b_| {
        b_.iter(|| run(black_box(&a), black_box(&b), BooleanOp::Intersection, ToleranceBundle::reference()).unwrap());
    });

    group.bench_function("difference_ab", |b_| {
        b_.iter(|| run(black_box(&a), black_box(&b), BooleanOp::DifferenceAB, ToleranceBundle::reference()).unwrap());
    });

    group.finish();
}

fn bench_sphere_sphere(c: &mut Criterion) {
    let mut group = c.benchmark_group("sphere_sphere");

    for segments in [8usize, 16, 32] {
        let a = sphere(Point3::new(0.0, 0.0, 0.0), 10.0, segments);
        let b = sphere(Point3::new(7.0, 0.0, 0.0), 10.0, segments);

        group.bench_with_input(BenchmarkId::new("union", segments), &(a, b), |bencher, (a, b)| {
            bencher.iter(|| run(black_box(a), black_box(b), BooleanOp::Union, ToleranceBundle::reference()).unwrap());
        });
    }

    group.finish();
}

fn bench_disjoint_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("disjoint_union");

    let a = cube(Vector3::new(10.0, 10.0, 10.0), true);
    let b = {
        let mut far = cube(Vector3::new(10.0, 10.0, 10.0), true);
        for vertex in &mut far.vertices {
            vertex.position += Vector3::new(1000.0, 0.0, 0.0);
        }
        far
    };

    group.bench_function("no_intersection", |b_| {
        b_.iter(|| run(black_box(&a), black_box(&b), BooleanOp::Union, ToleranceBundle::reference()).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_cube_cube, bench_sphere_sphere, bench_disjoint_union);
criterion_main!(benches);
