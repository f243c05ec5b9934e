use image::{ImageBuffer, Luma};
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Верхняя граница нормализованной высоты
pub const MAX_HEIGHT: i32 = 1000;

/// Двумерная карта высот: целые значения от 0 (низины) до 1000 (пики)
#[derive(Debug, Clone)]
pub struct Heightmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<i32>,
}

impl Heightmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> i32 {
        self.data[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: i32) {
        self.data[(y * self.width + x) as usize] = value;
    }

    /// Значение по знаковым координатам; `None` за пределами карты
    pub fn try_get(&self, x: i32, y: i32) -> Option<i32> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.get(x as u32, y as u32))
    }

    pub fn min_max(&self) -> (i32, i32) {
        self.data
            .iter()
            .fold((i32::MAX, i32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    pub fn to_grayscale_image(&self) -> Vec<u8> {
        #[cfg(feature = "parallel")]
        let iter = self.data.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = self.data.iter();

        iter.map(|&v| (v.clamp(0, MAX_HEIGHT) * 255 / MAX_HEIGHT) as u8)
            .collect()
    }

    pub fn save_as_png(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let img: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_raw(self.width, self.height, self.to_grayscale_image())
                .ok_or("Failed to create image buffer")?;
        img.save(path)?;
        Ok(())
    }

    /// Сдвигает минимум в 0 и растягивает диапазон до [0, 1000].
    ///
    /// Если все значения равны, карта просто обнуляется.
    pub fn normalize(&mut self) {
        if self.data.is_empty() {
            return;
        }
        let (lowest, highest) = self.min_max();
        let range = i64::from(highest) - i64::from(lowest);

        let rescale = |h: &mut i32| {
            let shifted = i64::from(*h) - i64::from(lowest);
            *h = if range == 0 {
                0
            } else {
                (shifted * i64::from(MAX_HEIGHT) / range) as i32
            };
        };

        #[cfg(feature = "parallel")]
        self.data.par_iter_mut().for_each(rescale);
        #[cfg(not(feature = "parallel"))]
        self.data.iter_mut().for_each(rescale);
    }

    /// Накладывает конический холм (или впадину) радиуса `radius` с центром в `(cx, cy)`
    fn stamp(&mut self, cx: i32, cy: i32, radius: i32, valley: bool) {
        let min_x = (cx - radius).max(0);
        let max_x = (cx + radius).min(self.width as i32 - 1);
        let min_y = (cy - radius).max(0);
        let max_y = (cy + radius).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = f64::from(x - cx);
                let dy = f64::from(y - cy);
                let hill = radius - (dx * dx + dy * dy).sqrt() as i32;
                if hill <= 0 {
                    continue;
                }
                let idx = (y as u32 * self.width + x as u32) as usize;
                if valley {
                    self.data[idx] = (self.data[idx] - hill).max(0);
                } else {
                    self.data[idx] += hill;
                }
            }
        }
    }
}

/// Режим острова: холмы собираются у центра, а за пределами радиуса
/// вместо холмов выкапываются впадины.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IslandShape {
    pub center_x: i32,
    pub center_y: i32,
    pub radius: i32,
}

impl IslandShape {
    /// Выводит форму острова из шкалы `island_size` (0..=10).
    ///
    /// - `0` — острова нет;
    /// - `1..5` — «прибрежная» карта, радиус до двух ширин карты;
    /// - `5..=10` — настоящий остров, радиус до половины ширины.
    ///
    /// Центр сдвигается на `off_center` вдоль одной случайно выбранной оси
    /// в случайную сторону; при нулевом смещении случайные числа не тратятся.
    pub fn from_scale<R: Rng + ?Sized>(
        rng: &mut R,
        island_size: u32,
        off_center: u32,
        width: u32,
        height: u32,
    ) -> Option<Self> {
        const MAX_ISLAND: i64 = 10;
        const MAX_COASTAL: i64 = 5;

        let size = i64::from(island_size.min(MAX_ISLAND as u32));
        let width = i64::from(width);
        let radius = if size >= MAX_COASTAL {
            let percent = 50 + ((MAX_ISLAND - size) * 50) / (MAX_ISLAND - MAX_COASTAL);
            (percent * (width / 2)) / 100
        } else if size > 0 {
            let percent = 40 + ((MAX_COASTAL - size) * 40) / MAX_COASTAL;
            (percent * width * 2) / 100
        } else {
            return None;
        };

        let mut center_x = (width / 2) as i32;
        let mut center_y = (height / 2) as i32;
        if off_center != 0 {
            let shift = off_center as i32;
            match rng.gen_range(0..4) {
                0 => center_x += shift,
                1 => center_y += shift,
                2 => center_x -= shift,
                _ => center_y -= shift,
            }
        }

        Some(Self {
            center_x,
            center_y,
            radius: radius.max(1) as i32,
        })
    }

    /// Для настоящих островов итераций и озёр нужно заметно меньше
    #[must_use]
    pub fn is_true_island(island_size: u32) -> bool {
        island_size >= 5
    }
}

/// Генерирует карту высот наложением `iterations` случайных холмов.
///
/// Радиус каждого холма выбирается из `[1, hill_size]`, вклад клетки —
/// `max(0, r - расстояние)`. Результат нормализуется в [0, 1000].
pub fn generate_heightmap<R: Rng + ?Sized>(
    rng: &mut R,
    width: u32,
    height: u32,
    iterations: usize,
    hill_size: u32,
    island: Option<IslandShape>,
) -> Heightmap {
    let mut heightmap = Heightmap::new(width, height);
    if width == 0 || height == 0 {
        return heightmap;
    }
    let hill_size = hill_size.max(1) as i32;

    for _ in 0..iterations {
        let (cx, cy, valley) = match island {
            Some(shape) => {
                let cx = shape.center_x - shape.radius + rng.gen_range(0..shape.radius * 2);
                let cy = shape.center_y - shape.radius + rng.gen_range(0..shape.radius * 2);
                let dx = f64::from(cx - shape.center_x);
                let dy = f64::from(cy - shape.center_y);
                let dist = (dx * dx + dy * dy).sqrt() as i32;
                (cx, cy, dist > shape.radius)
            }
            None => (
                rng.gen_range(0..width) as i32,
                rng.gen_range(0..height) as i32,
                false,
            ),
        };
        let radius = rng.gen_range(1..=hill_size);
        heightmap.stamp(cx, cy, radius, valley);
    }

    heightmap.normalize();
    tracing::trace!(
        target: "hexgen::heightmap",
        width,
        height,
        iterations,
        hill_size,
        island = island.is_some(),
        "heightmap synthesized"
    );
    heightmap
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn normalized_range_spans_zero_to_thousand() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let map = generate_heightmap(&mut rng, 60, 45, 300, 8, None);
        assert_eq!(map.min_max(), (0, MAX_HEIGHT));
    }

    #[test]
    fn zero_iterations_yield_flat_zero_map() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let map = generate_heightmap(&mut rng, 12, 9, 0, 1, None);
        assert!(map.data.iter().all(|&h| h == 0));
    }

    #[test]
    fn same_seed_same_map() {
        let a = generate_heightmap(&mut ChaCha8Rng::seed_from_u64(5), 30, 30, 80, 6, None);
        let b = generate_heightmap(&mut ChaCha8Rng::seed_from_u64(5), 30, 30, 80, 6, None);
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn single_hill_peaks_at_center() {
        let mut map = Heightmap::new(11, 11);
        map.stamp(5, 5, 4, false);
        assert_eq!(map.get(5, 5), 4);
        assert_eq!(map.get(6, 5), 3);
        assert_eq!(map.get(9, 5), 0);
        assert_eq!(map.get(0, 0), 0);
    }

    #[test]
    fn valley_never_goes_negative() {
        let mut map = Heightmap::new(7, 7);
        map.stamp(3, 3, 2, false);
        map.stamp(3, 3, 3, true);
        assert!(map.data.iter().all(|&h| h >= 0));
        assert_eq!(map.get(3, 3), 0);
    }

    #[test]
    fn island_mode_raises_the_middle() {
        let (w, h) = (90, 90);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let shape = IslandShape::from_scale(&mut rng, 7, 0, w, h).unwrap();
        let map = generate_heightmap(&mut rng, w, h, 400, 10, Some(shape));

        let mean = |x0: u32, y0: u32, side: u32| {
            let mut sum = 0i64;
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    sum += i64::from(map.get(x, y));
                }
            }
            sum / i64::from(side * side)
        };
        assert!(mean(35, 35, 20) > mean(0, 0, 10));
    }

    #[test]
    fn island_scale_zero_disables_island() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(IslandShape::from_scale(&mut rng, 0, 0, 90, 90), None);
        let coastal = IslandShape::from_scale(&mut rng, 2, 0, 90, 90).unwrap();
        let island = IslandShape::from_scale(&mut rng, 8, 0, 90, 90).unwrap();
        assert!(coastal.radius > island.radius);
    }

    #[test]
    fn off_center_shifts_along_a_single_axis() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut shifted = [false; 4];
        for _ in 0..64 {
            let shape = IslandShape::from_scale(&mut rng, 7, 5, 90, 60).unwrap();
            let (dx, dy) = (shape.center_x - 45, shape.center_y - 30);
            assert!(dx == 0 || dy == 0);
            assert_eq!(dx.abs() + dy.abs(), 5);
            let side = match (dx, dy) {
                (5, _) => 0,
                (_, 5) => 1,
                (-5, _) => 2,
                _ => 3,
            };
            shifted[side] = true;
        }
        assert!(shifted.iter().all(|&s| s));
    }
}
