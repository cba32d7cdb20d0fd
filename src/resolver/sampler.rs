use rand::rngs::StdRng;
use rand::SeedableRng;

/// Política de muestreo para playlists que superan el límite configurado.
///
/// Inyectable para que los tests fijen una semilla y el resultado sea
/// determinista.
pub trait PlaylistSampler: Send + Sync {
    /// Elige `take` índices distintos de `0..total`.
    fn sample(&self, total: usize, take: usize) -> Vec<usize>;
}

/// Muestreo uniforme sin reemplazo sobre todo el listado (nunca un prefijo).
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSampler {
    seed: Option<u64>,
}

impl UniformSampler {
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Variante determinista para tests.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl PlaylistSampler for UniformSampler {
    fn sample(&self, total: usize, take: usize) -> Vec<usize> {
        if take >= total {
            return (0..total).collect();
        }

        match self.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                rand::seq::index::sample(&mut rng, total, take).into_vec()
            }
            None => {
                let mut rng = rand::thread_rng();
                rand::seq::index::sample(&mut rng, total, take).into_vec()
            }
        }
    }
}
