//! Paper Ledger
//!
//! In-memory cash and position bookkeeping for simulated portfolios. Each
//! portfolio's book sits behind its own mutex, so fills against one portfolio
//! are applied one at a time while different portfolios proceed in parallel.
//!
//! Cash is allowed to go negative (margin). Limits on buying power belong to
//! the risk gate, not the ledger.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;

use crate::application::ports::{
    PerformanceReconciliationPort, PortfolioError, PortfolioRepository, ReconciliationError,
    SettlementError, TradeConfirmation, TradeRequest, TradeSettlementPort,
};
use crate::domain::risk_management::{ExecutionRecord, PortfolioSnapshot, PositionSnapshot};
use crate::domain::shared::{ExecutionId, Money, PortfolioId, Symbol, Timestamp};

#[derive(Debug, Clone, Copy)]
struct Holding {
    shares: Decimal,
    average_cost: Money,
}

#[derive(Debug)]
struct Book {
    cash: Money,
    positions: BTreeMap<Symbol, Holding>,
    executions: Vec<ExecutionRecord>,
    confirmations: HashMap<ExecutionId, TradeConfirmation>,
    opening_value: Money,
}

impl Book {
    fn new(cash: Money) -> Self {
        Self {
            cash,
            positions: BTreeMap::new(),
            executions: Vec::new(),
            confirmations: HashMap::new(),
            opening_value: cash,
        }
    }

    fn market_value(&self, marks: &HashMap<Symbol, Money>) -> Money {
        self.positions
            .iter()
            .map(|(symbol, holding)| {
                let mark = marks.get(symbol).copied().unwrap_or(holding.average_cost);
                mark * holding.shares
            })
            .sum()
    }

    fn total_value(&self, marks: &HashMap<Symbol, Money>) -> Money {
        self.cash + self.market_value(marks)
    }

    fn shares(&self, symbol: &Symbol) -> Decimal {
        self.positions
            .get(symbol)
            .map_or(Decimal::ZERO, |h| h.shares)
    }

    /// Move `signed` shares at `price` into the position for `symbol`.
    fn book_shares(&mut self, symbol: &Symbol, signed: Decimal, price: Money) -> Decimal {
        let current = self.positions.get(symbol).copied().unwrap_or(Holding {
            shares: Decimal::ZERO,
            average_cost: price,
        });
        let shares = current.shares + signed;

        if shares.is_zero() {
            self.positions.remove(symbol);
            return shares;
        }

        let average_cost = if current.shares.is_zero()
            || current.shares.is_sign_positive() == signed.is_sign_positive()
        {
            // Adding to the position: blend the cost.
            let cost = current.average_cost * current.shares.abs() + price * signed.abs();
            Money::new(cost.amount() / shares.abs())
        } else if current.shares.is_sign_positive() == shares.is_sign_positive() {
            current.average_cost
        } else {
            // Crossed through flat: the new side starts at this price.
            price
        };

        self.positions.insert(
            symbol.clone(),
            Holding {
                shares,
                average_cost,
            },
        );
        shares
    }
}

/// In-memory paper ledger.
#[derive(Debug, Default)]
pub struct PaperLedger {
    books: RwLock<HashMap<PortfolioId, Arc<Mutex<Book>>>>,
    marks: RwLock<HashMap<Symbol, Money>>,
}

impl PaperLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a portfolio with starting cash. Re-opening replaces the book.
    pub fn open_portfolio(&self, portfolio_id: PortfolioId, cash: Money) {
        tracing::debug!(portfolio_id = %portfolio_id, cash = %cash, "Opening paper portfolio");
        self.books
            .write()
            .insert(portfolio_id, Arc::new(Mutex::new(Book::new(cash))));
    }

    /// Set an existing position directly (for setup). The day's P&L
    /// baseline is reset to the resulting value.
    ///
    /// # Errors
    ///
    /// Returns error if the portfolio is unknown.
    pub fn seed_position(
        &self,
        portfolio_id: &PortfolioId,
        symbol: Symbol,
        shares: Decimal,
        average_cost: Money,
    ) -> Result<(), SettlementError> {
        let book = self.book(portfolio_id)?;
        self.marks.write().entry(symbol.clone()).or_insert(average_cost);
        let marks = self.marks.read();
        let mut book = book.lock();
        if shares.is_zero() {
            book.positions.remove(&symbol);
        } else {
            book.positions.insert(
                symbol,
                Holding {
                    shares,
                    average_cost,
                },
            );
        }
        book.opening_value = book.total_value(&marks);
        Ok(())
    }

    /// Record a historical execution (for setup), e.g. to seed day-trade
    /// history. Positions and cash are not changed.
    ///
    /// # Errors
    ///
    /// Returns error if the portfolio is unknown.
    pub fn seed_execution(
        &self,
        portfolio_id: &PortfolioId,
        record: ExecutionRecord,
    ) -> Result<(), SettlementError> {
        self.book(portfolio_id)?.lock().executions.push(record);
        Ok(())
    }

    /// Update the mark used to value positions in `symbol`.
    pub fn mark_price(&self, symbol: Symbol, price: Money) {
        self.marks.write().insert(symbol, price);
    }

    /// Current cash of a portfolio.
    #[must_use]
    pub fn cash(&self, portfolio_id: &PortfolioId) -> Option<Money> {
        self.books
            .read()
            .get(portfolio_id)
            .map(|book| book.lock().cash)
    }

    /// Signed shares held, zero when flat or unknown.
    #[must_use]
    pub fn shares(&self, portfolio_id: &PortfolioId, symbol: &Symbol) -> Decimal {
        self.books
            .read()
            .get(portfolio_id)
            .map_or(Decimal::ZERO, |book| book.lock().shares(symbol))
    }

    /// Number of trades booked, seeded executions included.
    #[must_use]
    pub fn trade_count(&self, portfolio_id: &PortfolioId) -> usize {
        self.books
            .read()
            .get(portfolio_id)
            .map_or(0, |book| book.lock().executions.len())
    }

    fn book(&self, portfolio_id: &PortfolioId) -> Result<Arc<Mutex<Book>>, SettlementError> {
        self.books
            .read()
            .get(portfolio_id)
            .cloned()
            .ok_or_else(|| SettlementError::PortfolioNotFound {
                portfolio_id: portfolio_id.to_string(),
            })
    }
}

#[async_trait]
impl TradeSettlementPort for PaperLedger {
    async fn execute_trade(
        &self,
        request: &TradeRequest,
    ) -> Result<TradeConfirmation, SettlementError> {
        if !request.quantity.is_positive() {
            return Err(SettlementError::Rejected {
                reason: format!("quantity must be positive, got {}", request.quantity),
            });
        }
        if !request.price.is_positive() {
            return Err(SettlementError::Rejected {
                reason: format!("price must be positive, got {}", request.price),
            });
        }
        if request.commission.is_negative() {
            return Err(SettlementError::Rejected {
                reason: format!("commission cannot be negative, got {}", request.commission),
            });
        }

        let book = self.book(&request.portfolio_id)?;
        let mut book = book.lock();

        if let Some(existing) = book.confirmations.get(&request.execution_id) {
            tracing::debug!(
                execution_id = %request.execution_id,
                "Duplicate settlement request, returning original confirmation"
            );
            return Ok(existing.clone());
        }

        let signed = request.side.sign() * request.quantity.amount();
        let position_after = book.book_shares(&request.symbol, signed, request.price);
        book.cash = book.cash - request.cash_debit();

        let settled_at = Timestamp::now();
        book.executions.push(ExecutionRecord {
            symbol: request.symbol.clone(),
            side: request.side,
            quantity: request.quantity,
            executed_at: settled_at,
        });

        let confirmation = TradeConfirmation {
            execution_id: request.execution_id.clone(),
            portfolio_id: request.portfolio_id.clone(),
            quantity: request.quantity,
            price: request.price,
            commission: request.commission,
            cash_after: book.cash,
            position_after,
            settled_at,
        };
        book.confirmations
            .insert(request.execution_id.clone(), confirmation.clone());
        drop(book);

        // Marks are only taken after the book lock is released; readers lock
        // marks first.
        self.marks.write().insert(request.symbol.clone(), request.price);

        tracing::info!(
            portfolio_id = %request.portfolio_id,
            order_id = %request.order_id,
            symbol = %request.symbol,
            side = ?request.side,
            quantity = %request.quantity,
            price = %request.price,
            cash_after = %confirmation.cash_after,
            "Trade settled"
        );
        Ok(confirmation)
    }

    async fn find_confirmation(
        &self,
        portfolio_id: &PortfolioId,
        execution_id: &ExecutionId,
    ) -> Result<Option<TradeConfirmation>, SettlementError> {
        Ok(self
            .book(portfolio_id)?
            .lock()
            .confirmations
            .get(execution_id)
            .cloned())
    }
}

#[async_trait]
impl PortfolioRepository for PaperLedger {
    async fn portfolio_ids(&self) -> Result<Vec<PortfolioId>, PortfolioError> {
        let mut ids: Vec<PortfolioId> = self.books.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn find_snapshot(
        &self,
        portfolio_id: &PortfolioId,
    ) -> Result<Option<PortfolioSnapshot>, PortfolioError> {
        let Ok(book) = self.book(portfolio_id) else {
            return Ok(None);
        };
        let marks = self.marks.read();
        let book = book.lock();
        let total_value = book.total_value(&marks);

        Ok(Some(PortfolioSnapshot {
            portfolio_id: portfolio_id.clone(),
            cash: book.cash,
            total_value,
            equity: total_value,
            daily_pnl: total_value - book.opening_value,
            positions: book
                .positions
                .iter()
                .map(|(symbol, holding)| PositionSnapshot {
                    symbol: symbol.clone(),
                    shares: holding.shares,
                    average_cost: holding.average_cost,
                })
                .collect(),
            executions: book.executions.clone(),
            as_of: Timestamp::now(),
        }))
    }
}

#[async_trait]
impl PerformanceReconciliationPort for PaperLedger {
    /// Close the day: the current value becomes the next session's P&L
    /// baseline.
    async fn reconcile(&self, portfolio_id: &PortfolioId) -> Result<(), ReconciliationError> {
        let book = self
            .book(portfolio_id)
            .map_err(|_| ReconciliationError::PortfolioNotFound {
                portfolio_id: portfolio_id.to_string(),
            })?;
        let marks = self.marks.read();
        let mut book = book.lock();
        let closing_value = book.total_value(&marks);
        tracing::info!(
            portfolio_id = %portfolio_id,
            opening_value = %book.opening_value,
            closing_value = %closing_value,
            "Portfolio reconciled"
        );
        book.opening_value = closing_value;
        Ok(())
    }
}
