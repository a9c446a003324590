use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use http::Method;
use jsonecho::common::spawn_test_server;
use jsonecho::http::{HttpCodec, Request};
use jsonecho::{EchoResponse, HttpConfig, HttpEchoClient};
use tokio::runtime::Runtime;
use tokio_util::codec::Decoder;

fn json_body(size: usize) -> String {
    let filler = "x".repeat(size.saturating_sub(16));
    format!(r#"{{"data":"{filler}"}}"#)
}

fn bench_echo_roundtrip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (server_handle, addr) = rt
        .block_on(spawn_test_server(HttpConfig::default()))
        .unwrap();

    let mut group = c.benchmark_group("echo_roundtrip");

    // Test different body sizes
    for size in [0, 256, 4096, 65536] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("post", size), &size, |b, &size| {
            let body = json_body(size);
            let mut client = rt.block_on(HttpEchoClient::connect(addr)).unwrap();

            b.iter(|| {
                let request = Request::new(Method::POST, "/bench")
                    .with_header("Host", "localhost")
                    .with_body(body.clone());
                let echo = rt.block_on(client.echo(black_box(request))).unwrap();
                assert_eq!(echo.path, "/bench");
            });
        });
    }

    group.finish();
    server_handle.abort();
}

fn bench_decode(c: &mut Criterion) {
    let raw = format!(
        "POST /bench?x=1 HTTP/1.1\r\nHost: localhost\r\nUser-Agent: bench\r\nAccept: */*\r\nContent-Length: {}\r\n\r\n{}",
        json_body(1024).len(),
        json_body(1024)
    );

    c.bench_function("decode_request", |b| {
        b.iter(|| {
            let mut codec = HttpCodec::new(1024 * 1024);
            let mut buf = BytesMut::from(raw.as_str());
            black_box(codec.decode(&mut buf).unwrap())
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_echo");

    for size in [64, 1024, 16384] {
        let request = Request::new(Method::POST, "/bench")
            .with_header("Host", "localhost")
            .with_header("Content-Type", "application/json")
            .with_body(json_body(size));

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("json_body", size), &request, |b, request| {
            b.iter(|| {
                let echo = EchoResponse::from_request(black_box(request));
                black_box(echo.to_pretty_json().unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_echo_roundtrip, bench_decode, bench_render);
criterion_main!(benches);
