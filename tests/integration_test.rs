//! Session replay end to end with a mock data port and the paper broker.

mod common;

use approx::assert_relative_eq;
use common::*;
use linktrader::adapters::paper_broker::PaperBroker;
use linktrader::domain::error::{LinkError, SignalError};
use linktrader::domain::metrics::Metrics;
use linktrader::domain::order::OrderIntent;
use linktrader::domain::session::{Session, SessionConfig};
use linktrader::domain::strategy::{BuyAndHoldStrategy, RatioStrategy, ValueMomentumStrategy};
use linktrader::domain::value_column::DataDescriptor;
use linktrader::ports::broker_port::BrokerPort;

fn ratio_port() -> MockDataPort {
    MockDataPort::new()
        .with_values(
            "WIKI/IBM",
            &[
                ("2014-01-02", 100.0),
                ("2014-01-03", 100.0),
                ("2014-01-06", 120.0),
                ("2014-01-07", 100.0),
            ],
        )
        .with_values(
            "WIKI/FB",
            &[
                ("2014-01-02", 110.0),
                ("2014-01-03", 105.0),
                ("2014-01-06", 90.0),
                ("2014-01-07", 100.0),
            ],
        )
}

fn ratio_session() -> Session {
    Session::initialize(sample_session(), Box::new(RatioStrategy::new(ratio_params()))).unwrap()
}

mod ratio_strategy {
    use super::*;

    #[test]
    fn buys_then_liquidates() {
        let port = ratio_port();
        let mut broker = PaperBroker::new(25_000.0);
        let result = ratio_session().run(&port, &mut broker).unwrap();

        assert_eq!(result.events, 4);
        assert_eq!(
            result.intents,
            vec![
                (date(2014, 1, 2), OrderIntent::buy("WIKI/IBM", 100)),
                (date(2014, 1, 6), OrderIntent::Liquidate),
            ]
        );

        let portfolio = broker.portfolio();
        assert!(portfolio.positions.is_empty());
        assert_eq!(portfolio.closed_trades.len(), 1);
        let trade = &portfolio.closed_trades[0];
        assert_eq!(trade.symbol, "WIKI/IBM");
        assert_eq!(trade.entry_date, date(2014, 1, 2));
        assert_eq!(trade.exit_date, date(2014, 1, 6));
        assert_relative_eq!(trade.pnl, 2000.0);
    }

    #[test]
    fn metrics_follow_equity_curve() {
        let port = ratio_port();
        let mut broker = PaperBroker::new(25_000.0);
        ratio_session().run(&port, &mut broker).unwrap();

        let portfolio = broker.into_portfolio();
        assert_eq!(portfolio.equity_curve.len(), 4);
        let m = Metrics::compute(&portfolio);
        assert_relative_eq!(m.final_equity, 27_000.0);
        assert_relative_eq!(m.total_return, 0.08);
        assert_eq!(m.total_trades, 1);
        assert_relative_eq!(m.win_rate, 1.0);
    }

    #[test]
    fn subscriptions_use_their_descriptors() {
        let port = ratio_port();
        let mut broker = PaperBroker::new(25_000.0);
        ratio_session().run(&port, &mut broker).unwrap();

        let requests = port.requests.borrow();
        assert_eq!(
            *requests,
            vec![
                ("WIKI/IBM".to_string(), DataDescriptor::Default),
                (
                    "WIKI/FB".to_string(),
                    DataDescriptor::custom("adj. close").unwrap()
                ),
            ]
        );
    }

    #[test]
    fn plots_sampled_once_per_date() {
        let port = ratio_port();
        let mut broker = PaperBroker::new(25_000.0);
        let result = ratio_session().run(&port, &mut broker).unwrap();

        let ratio: Vec<f64> = result
            .plots
            .iter()
            .filter(|s| s.chart == "Ratio")
            .map(|s| s.value)
            .collect();
        assert_eq!(ratio.len(), 4);
        assert_relative_eq!(ratio[0], 1.1);
        assert_relative_eq!(ratio[2], 0.75);

        let data = result.plots.iter().filter(|s| s.chart == "Data").count();
        assert_eq!(data, 8);
        assert!(result
            .plots
            .iter()
            .any(|s| s.series == "SMA(WIKI/FB,1)" && s.value == 110.0));
    }

    #[test]
    fn zero_denominator_aborts_run() {
        let port = MockDataPort::new()
            .with_values("WIKI/IBM", &[("2014-01-02", 100.0), ("2014-01-03", 0.0)])
            .with_values("WIKI/FB", &[("2014-01-02", 110.0), ("2014-01-03", 105.0)]);
        let mut broker = PaperBroker::new(25_000.0);
        let err = ratio_session().run(&port, &mut broker).unwrap_err();

        match err {
            LinkError::Signal(SignalError::DivideByZero { indicator, date: d }) => {
                assert_eq!(indicator, "OVER(#1,#0)");
                assert_eq!(d, date(2014, 1, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
        // the first day's buy went through before the failure
        assert!(broker.state().invested());
    }

    #[test]
    fn waits_until_both_series_have_values() {
        let port = MockDataPort::new()
            .with_values("WIKI/IBM", &[("2014-01-02", 100.0), ("2014-01-03", 100.0)])
            .with_rows(
                "WIKI/FB",
                vec![
                    make_row("WIKI/FB", "2014-01-02", None),
                    make_row("WIKI/FB", "2014-01-03", Some(110.0)),
                ],
            );
        let mut broker = PaperBroker::new(25_000.0);
        let result = ratio_session().run(&port, &mut broker).unwrap();

        assert_eq!(result.events, 2);
        assert_eq!(
            result.intents,
            vec![(date(2014, 1, 3), OrderIntent::buy("WIKI/IBM", 100))]
        );
    }

    #[test]
    fn rows_outside_window_ignored() {
        let port = MockDataPort::new()
            .with_values("WIKI/IBM", &[("2013-12-31", 100.0), ("2014-01-02", 100.0)])
            .with_values("WIKI/FB", &[("2013-12-31", 200.0), ("2014-01-02", 90.0)]);
        let mut broker = PaperBroker::new(25_000.0);
        let result = ratio_session().run(&port, &mut broker).unwrap();

        assert_eq!(result.events, 1);
        assert_eq!(
            result.intents,
            vec![(date(2014, 1, 2), OrderIntent::Liquidate)]
        );
        assert!(broker.portfolio().closed_trades.is_empty());
    }
}

mod buy_and_hold_strategy {
    use super::*;

    #[test]
    fn allocates_once() {
        let port = MockDataPort::new().with_values(
            "SHFE/SCF2021",
            &[
                ("2019-10-01", 300.0),
                ("2019-10-02", 310.0),
                ("2019-10-03", 320.0),
            ],
        );
        let config = SessionConfig::new(
            date(2019, 10, 1),
            date(2020, 12, 31),
            25_000.0,
        )
        .unwrap();
        let strategy = BuyAndHoldStrategy::new(buy_and_hold_params("SHFE/SCF2021"));
        let session = Session::initialize(config, Box::new(strategy)).unwrap();
        let mut broker = PaperBroker::new(25_000.0);
        let result = session.run(&port, &mut broker).unwrap();

        assert_eq!(
            result.intents,
            vec![(
                date(2019, 10, 1),
                OrderIntent::set_holdings("SHFE/SCF2021", 1.0)
            )]
        );
        assert_eq!(broker.state().quantity("SHFE/SCF2021"), 83);
        assert_relative_eq!(broker.portfolio().cash, 100.0);
        assert_eq!(
            port.requests.borrow()[0].1,
            DataDescriptor::custom("settle").unwrap()
        );
    }

    #[test]
    fn plots_price_sma_under_symbol() {
        let port = MockDataPort::new().with_values(
            "WIKI/IBM",
            &[
                ("2014-01-02", 10.0),
                ("2014-01-03", 20.0),
                ("2014-01-06", 30.0),
            ],
        );
        let mut params = buy_and_hold_params("WIKI/IBM");
        params.descriptor = DataDescriptor::Default;
        params.sma_period = Some(2);
        let session =
            Session::initialize(sample_session(), Box::new(BuyAndHoldStrategy::new(params)))
                .unwrap();
        let mut broker = PaperBroker::new(25_000.0);
        let result = session.run(&port, &mut broker).unwrap();

        let values: Vec<f64> = result
            .plots
            .iter()
            .filter(|s| s.chart == "WIKI/IBM" && s.series == "PriceSMA")
            .map(|s| s.value)
            .collect();
        assert_eq!(values, vec![15.0, 25.0]);
    }
}

mod failures {
    use super::*;

    #[test]
    fn no_rows_at_all() {
        let port = MockDataPort::new();
        let mut broker = PaperBroker::new(25_000.0);
        let err = ratio_session().run(&port, &mut broker).unwrap_err();
        assert!(matches!(err, LinkError::NoData { ref symbol } if symbol == "WIKI/IBM,WIKI/FB"));
    }

    #[test]
    fn data_source_error_propagates() {
        let port = ratio_port().with_error("WIKI/FB", "HTTP 500");
        let mut broker = PaperBroker::new(25_000.0);
        let err = ratio_session().run(&port, &mut broker).unwrap_err();
        assert!(matches!(err, LinkError::DataSource { ref reason } if reason == "HTTP 500"));
    }

    #[test]
    fn rejected_orders_do_not_abort() {
        let port = ratio_port();
        let config = SessionConfig::new(date(2014, 1, 1), date(2018, 1, 1), 1_000.0).unwrap();
        let session =
            Session::initialize(config, Box::new(RatioStrategy::new(ratio_params()))).unwrap();
        let mut broker = PaperBroker::new(1_000.0);
        let result = session.run(&port, &mut broker).unwrap();

        // every buy is rejected for cash, so the flat rule keeps firing
        assert_eq!(result.intents.len(), 3);
        assert!(!broker.state().invested());
        assert_relative_eq!(broker.portfolio().cash, 1_000.0);
    }

    #[test]
    fn broker_cash_must_match_session() {
        let port = ratio_port();
        let mut broker = PaperBroker::new(1_000.0);
        let err = ratio_session().run(&port, &mut broker).unwrap_err();
        assert!(matches!(err, LinkError::ConfigInvalid { ref key, .. } if key == "cash"));
        assert!(port.requests.borrow().is_empty());
        assert!(broker.portfolio().equity_curve.is_empty());
    }
}

mod replay {
    use super::*;

    #[test]
    fn fresh_sessions_replay_identically() {
        let port = ratio_port();
        let mut first_broker = PaperBroker::new(25_000.0);
        let first = ratio_session().run(&port, &mut first_broker).unwrap();
        let mut second_broker = PaperBroker::new(25_000.0);
        let second = ratio_session().run(&port, &mut second_broker).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_broker.portfolio(), second_broker.portfolio());
        // no plot sample is carried over between runs
        assert_eq!(second.plots.iter().filter(|s| s.chart == "Ratio").count(), 4);
    }
}

mod value_momentum_strategy {
    use super::*;

    fn momentum_port(history: &[(&str, f64)]) -> MockDataPort {
        let mut signal = history.to_vec();
        signal.extend([("2021-01-05", 82.0), ("2021-01-06", 81.0)]);
        MockDataPort::new()
            .with_values(
                "SPY",
                &[
                    ("2021-01-04", 100.0),
                    ("2021-01-05", 100.0),
                    ("2021-01-06", 110.0),
                ],
            )
            .with_values("UMICH/SOC1", &signal)
    }

    fn momentum_session(history: usize) -> Session {
        let mut params = value_momentum_params();
        params.history = history;
        let config = SessionConfig::new(date(2021, 1, 1), date(2021, 7, 1), 10_000.0).unwrap();
        Session::initialize(config, Box::new(ValueMomentumStrategy::new(params))).unwrap()
    }

    #[test]
    fn history_seeds_the_first_comparison() {
        let port = momentum_port(&[("2020-11-01", 76.9), ("2020-12-01", 80.7)]);
        let mut broker = PaperBroker::new(10_000.0);
        let result = momentum_session(10).run(&port, &mut broker).unwrap();

        assert_eq!(result.history_rows, 2);
        assert_eq!(result.events, 3);
        assert_eq!(
            result.intents,
            vec![
                (date(2021, 1, 5), OrderIntent::set_holdings("SPY", 1.0)),
                (date(2021, 1, 6), OrderIntent::set_holdings("SPY", -1.0)),
            ]
        );
        // long 100 at 100, closed at 110, short leg rejected
        let portfolio = broker.portfolio();
        assert!(portfolio.positions.is_empty());
        assert_eq!(portfolio.closed_trades.len(), 1);
        assert_relative_eq!(portfolio.closed_trades[0].pnl, 1000.0);
        assert_relative_eq!(portfolio.cash, 11_000.0);

        let requests: Vec<String> = port.requests.borrow().iter().map(|r| r.0.clone()).collect();
        assert_eq!(requests, vec!["UMICH/SOC1", "SPY", "UMICH/SOC1"]);
    }

    #[test]
    fn history_keeps_only_the_latest_rows() {
        let port = momentum_port(&[("2020-11-01", 90.0), ("2020-12-01", 80.7)]);
        let mut broker = PaperBroker::new(10_000.0);
        let result = momentum_session(1).run(&port, &mut broker).unwrap();

        assert_eq!(result.history_rows, 1);
        assert_eq!(
            result.intents[0],
            (date(2021, 1, 5), OrderIntent::set_holdings("SPY", 1.0))
        );
    }

    #[test]
    fn without_history_first_signal_is_short_and_rejected() {
        let port = momentum_port(&[("2020-12-01", 80.7)]);
        let mut broker = PaperBroker::new(10_000.0);
        let result = momentum_session(0).run(&port, &mut broker).unwrap();

        assert_eq!(result.history_rows, 0);
        assert_eq!(
            result.intents,
            vec![
                (date(2021, 1, 5), OrderIntent::set_holdings("SPY", -1.0)),
                (date(2021, 1, 6), OrderIntent::set_holdings("SPY", -1.0)),
            ]
        );
        assert!(!broker.state().invested());
        assert_relative_eq!(broker.portfolio().cash, 10_000.0);
        assert_eq!(port.requests.borrow().len(), 2);
    }
}
