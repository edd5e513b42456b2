use std::hint::black_box;

use bencher::FIXTURES;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use inter_http::codec::{DEFAULT_MAX_HEADERS, Parsed, RequestParser};
use inter_http::protocol::ParseError;

fn benchmark_request_parser(criterion: &mut Criterion) {
    let parser = RequestParser::new();
    let mut group = criterion.benchmark_group("request_parser");

    for fixture in FIXTURES {
        group.throughput(Throughput::Bytes(fixture.head_len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fixture.name()), fixture, |b, fixture| {
            b.iter(|| {
                let parsed = parser.parse(black_box(fixture.bytes())).expect("fixture should be a valid http request head");
                assert!(matches!(parsed, Parsed::Complete { consumed, .. } if consumed == fixture.head_len()));
                black_box(parsed);
            });
        });
    }

    group.finish();
}

fn benchmark_httparse(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("httparse");

    for fixture in FIXTURES {
        group.throughput(Throughput::Bytes(fixture.head_len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fixture.name()), fixture, |b, fixture| {
            b.iter(|| {
                let mut headers = [httparse::EMPTY_HEADER; DEFAULT_MAX_HEADERS];
                let mut request = httparse::Request::new(&mut headers);
                let status = request.parse(black_box(fixture.bytes())).expect("fixture should be a valid http request head");
                black_box(status.is_complete());
            });
        });
    }

    group.finish();
}

/// Delivers each fixture in fixed-size reads and parses after every one of them.
fn benchmark_split_reads(criterion: &mut Criterion) {
    const READ_SIZE: usize = 16;

    let parser = RequestParser::new();
    let mut group = criterion.benchmark_group("request_parser_split_reads");

    for fixture in FIXTURES {
        group.throughput(Throughput::Bytes(fixture.head_len() as u64));
        group.bench_with_input(BenchmarkId::new(format!("read_{READ_SIZE}"), fixture.name()), fixture, |b, fixture| {
            let bytes = fixture.bytes();
            b.iter(|| {
                let mut end = 0;
                loop {
                    end = (end + READ_SIZE).min(bytes.len());
                    if let Parsed::Complete { consumed, .. } = parser.parse(black_box(&bytes[..end])).expect("valid prefix") {
                        black_box(consumed);
                        break;
                    }
                }
            });
        });
    }

    group.finish();
}

/// A head made only of tiny header lines, rejected once the count limit is passed.
fn benchmark_header_flood(criterion: &mut Criterion) {
    let mut flood = String::from("GET / HTTP/1.1\r\n");
    for i in 0..1000 {
        flood.push_str(&format!("h{i}:v\r\n"));
    }
    let parser = RequestParser::new();

    criterion.bench_function("request_parser_header_flood", |b| {
        b.iter(|| {
            let result = parser.parse(black_box(flood.as_bytes()));
            assert!(matches!(result, Err(ParseError::TooManyHeaders { .. })));
        });
    });
}

criterion_group!(parser, benchmark_request_parser, benchmark_httparse, benchmark_split_reads, benchmark_header_flood);
criterion_main!(parser);
